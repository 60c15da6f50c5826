// ABOUTME: Google Play batchexecute client for the public reviews endpoint
// ABOUTME: Speaks the undocumented UiIu0d RPC and decodes its nested-array payload

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use super::{RawReview, ReviewPage, ReviewPageFetcher, SortOrder};
use crate::errors::{AppError, AppResult};
use chrono::DateTime;
use reqwest::Client;
use std::time::Duration;
use url::form_urlencoded;

const BATCHEXECUTE_URL: &str = "https://play.google.com/_/PlayStoreUi/data/batchexecute";

/// RPC id of the reviews endpoint
const REVIEWS_RPC_ID: &str = "UiIu0d";

/// Prefix Google puts in front of the JSON body to break naive eval
const ANTI_JSON_PREFIX: &str = ")]}'";

const REQUEST_TIMEOUT_SECS: u64 = 30;

impl SortOrder {
    /// Numeric sort code used by the RPC
    const fn rpc_code(self) -> u8 {
        match self {
            Self::Recientes => 2,
            Self::Relevantes => 1,
        }
    }
}

/// Fetcher speaking Google Play's batchexecute protocol
///
/// The endpoint is the same one the Play web UI uses. Responses are nested
/// JSON arrays with positional fields; the indices below mirror the UI's
/// decoder and are the de-facto stable part of the protocol.
pub struct PlayStoreFetcher {
    client: Client,
}

impl PlayStoreFetcher {
    /// Create a fetcher with a standalone HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new() -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Build the `f.req` envelope for one reviews RPC call
    fn build_request_body(
        app_id: &str,
        sort: SortOrder,
        count: usize,
        token: Option<&str>,
    ) -> String {
        // Inner payload: [null, null, [2, sort, [count, null, token]], [app_id, 7]]
        let pagination = match token {
            Some(t) => serde_json::json!([count, null, t]),
            None => serde_json::json!([count]),
        };
        let inner = serde_json::json!([
            null,
            null,
            [2, sort.rpc_code(), pagination],
            [app_id, 7]
        ]);

        let envelope = serde_json::json!([[[
            REVIEWS_RPC_ID,
            inner.to_string(),
            null,
            "generic"
        ]]]);

        form_urlencoded::Serializer::new(String::new())
            .append_pair("f.req", &envelope.to_string())
            .finish()
    }

    /// Decode the double-wrapped batchexecute response into reviews
    fn parse_response(body: &str) -> AppResult<ReviewPage> {
        let stripped = body
            .strip_prefix(ANTI_JSON_PREFIX)
            .unwrap_or(body)
            .trim_start();

        let outer: serde_json::Value = serde_json::from_str(stripped)
            .map_err(|e| AppError::external_service("PlayStore", format!("Bad envelope: {e}")))?;

        // Payload is a JSON string at [0][2] of the envelope
        let payload_str = outer
            .get(0)
            .and_then(|v| v.get(2))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                AppError::external_service("PlayStore", "Envelope missing payload at [0][2]")
            })?;

        let payload: serde_json::Value = serde_json::from_str(payload_str)
            .map_err(|e| AppError::external_service("PlayStore", format!("Bad payload: {e}")))?;

        let items = payload
            .get(0)
            .and_then(serde_json::Value::as_array)
            .cloned()
            .unwrap_or_default();

        let reviews = items
            .iter()
            .filter_map(Self::parse_review)
            .collect::<Vec<_>>();

        // Continuation token is the last item of the payload's last element
        let token = payload
            .as_array()
            .filter(|arr| arr.len() > 1)
            .and_then(|arr| arr.last())
            .and_then(serde_json::Value::as_array)
            .and_then(|arr| arr.last())
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned);

        Ok((reviews, token))
    }

    /// Decode one positional review record; malformed entries are dropped
    fn parse_review(item: &serde_json::Value) -> Option<RawReview> {
        let id = item.get(0)?.as_str()?.to_owned();
        let author = item
            .get(1)
            .and_then(|v| v.get(0))
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rating = item.get(2)?.as_u64().filter(|r| (1..=5).contains(r))? as u8;
        let text = item
            .get(4)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let epoch_secs = item
            .get(5)
            .and_then(|v| v.get(0))
            .and_then(serde_json::Value::as_i64)?;
        let date = DateTime::from_timestamp(epoch_secs, 0)?
            .format("%Y-%m-%d")
            .to_string();

        Some(RawReview {
            id,
            author,
            text,
            rating,
            date,
        })
    }
}

#[async_trait::async_trait]
impl ReviewPageFetcher for PlayStoreFetcher {
    async fn fetch_page(
        &self,
        app_id: &str,
        lang: &str,
        country: &str,
        sort: SortOrder,
        count: usize,
        token: Option<&str>,
    ) -> AppResult<ReviewPage> {
        let url = format!("{BATCHEXECUTE_URL}?hl={lang}&gl={country}");
        let body = Self::build_request_body(app_id, sort, count, token);

        let response = self
            .client
            .post(&url)
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .body(body)
            .send()
            .await
            .map_err(|e| {
                AppError::external_service("PlayStore", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                "PlayStore",
                format!("Reviews endpoint returned {status}"),
            ));
        }

        let text = response.text().await.map_err(|e| {
            AppError::external_service("PlayStore", format!("Failed to read response: {e}"))
        })?;

        Self::parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_is_form_encoded() {
        let body = PlayStoreFetcher::build_request_body("com.example.app", SortOrder::Recientes, 100, None);
        assert!(body.starts_with("f.req=%5B%5B%5B%22UiIu0d%22"));
        assert!(!body.contains('"'));
    }

    #[test]
    fn request_body_decodes_back_to_the_envelope() {
        let body = PlayStoreFetcher::build_request_body(
            "com.example.app",
            SortOrder::Relevantes,
            100,
            Some("page=token&x"),
        );

        let (key, value) = form_urlencoded::parse(body.as_bytes())
            .next()
            .expect("one form pair");
        assert_eq!(key, "f.req");

        let envelope: serde_json::Value = serde_json::from_str(&value).unwrap();
        assert_eq!(envelope[0][0][0], "UiIu0d");
        let inner: serde_json::Value =
            serde_json::from_str(envelope[0][0][1].as_str().unwrap()).unwrap();
        assert_eq!(inner[3][0], "com.example.app");
        assert_eq!(inner[2][2][2], "page=token&x");
    }

    #[test]
    fn parse_review_drops_malformed_entries() {
        let valid = serde_json::json!([
            "gp:review-1",
            ["Ana"],
            2,
            null,
            "No puedo entrar a mi cuenta",
            [1_736_899_200]
        ]);
        let review = PlayStoreFetcher::parse_review(&valid).unwrap();
        assert_eq!(review.id, "gp:review-1");
        assert_eq!(review.rating, 2);
        assert_eq!(review.date, "2025-01-15");

        let missing_rating = serde_json::json!(["gp:review-2", ["Luis"], null]);
        assert!(PlayStoreFetcher::parse_review(&missing_rating).is_none());
    }

    #[test]
    fn parse_response_extracts_reviews_and_token() {
        let payload = serde_json::json!([
            [[
                "gp:review-1",
                ["Ana"],
                1,
                null,
                "La app se cierra sola",
                [1_736_899_200]
            ]],
            ["ignored", "next-page-token"]
        ]);
        let envelope = serde_json::json!([[null, null, payload.to_string()]]);
        let body = format!(")]}}'\n{envelope}");

        let (reviews, token) = PlayStoreFetcher::parse_response(&body).unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].text, "La app se cierra sola");
        assert_eq!(token.as_deref(), Some("next-page-token"));
    }
}
