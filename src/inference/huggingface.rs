// ABOUTME: Hugging Face Inference API client for the hosted classification endpoints
// ABOUTME: Absorbs backend failures into fail-safe batch outcomes instead of errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{
    BinaryBatch, CategoryBatch, CategoryPrediction, ClassifierModelId, TextClassifier,
    BINARY_ENDPOINT, RELEVANT_LABEL,
};
use crate::errors::{AppError, AppResult};

/// Environment variable for the Hugging Face access token
const HF_TOKEN_ENV: &str = "HF_TOKEN";

/// Per-request timeout for inference calls
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Inference API request body
///
/// `parameters` is sent empty so the endpoint applies its deployed defaults.
#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a [String],
    parameters: serde_json::Map<String, serde_json::Value>,
}

/// Single label score as returned by a text-classification endpoint
#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Classifier backed by the hosted Hugging Face inference endpoints
///
/// One client serves both cascade stages: the binary relevance filter lives at
/// a fixed endpoint, the multiclass stage at the endpoint of the selected
/// registry model.
pub struct HfInferenceClient {
    client: Client,
    token: String,
}

impl HfInferenceClient {
    /// Create a new client with the given access token
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(token: String) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, token })
    }

    /// Create a client from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if `HF_TOKEN` is not set
    pub fn from_env() -> AppResult<Self> {
        let token = std::env::var(HF_TOKEN_ENV).map_err(|_| {
            AppError::config(format!("Missing {HF_TOKEN_ENV} environment variable"))
        })?;

        Self::new(token)
    }

    /// POST a batch of texts to an endpoint and return the top label per text
    ///
    /// Endpoints return one descending-sorted label list per input; only the
    /// top entry matters for the cascade.
    async fn query_endpoint(
        &self,
        endpoint: &str,
        texts: &[String],
    ) -> AppResult<Vec<LabelScore>> {
        let request = InferenceRequest {
            inputs: texts,
            parameters: serde_json::Map::new(),
        };

        let response = self
            .client
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::external_service("HuggingFace", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service("HuggingFace", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => AppError::external_auth(
                    "HuggingFace",
                    format!("Inference endpoint rejected credentials ({status})"),
                ),
                _ => AppError::external_service(
                    "HuggingFace",
                    format!(
                        "Endpoint error ({}): {}",
                        status,
                        body.chars().take(200).collect::<String>()
                    ),
                ),
            });
        }

        let parsed: Vec<Vec<LabelScore>> = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service("HuggingFace", format!("Failed to parse response: {e}"))
        })?;

        if parsed.len() != texts.len() {
            return Err(AppError::external_service(
                "HuggingFace",
                format!(
                    "Endpoint returned {} predictions for {} inputs",
                    parsed.len(),
                    texts.len()
                ),
            ));
        }

        parsed
            .into_iter()
            .map(|mut scores| {
                // Endpoints sort descending, but sort defensively on score anyway
                scores.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                scores.into_iter().next().ok_or_else(|| {
                    AppError::external_service("HuggingFace", "Endpoint returned empty label list")
                })
            })
            .collect()
    }
}

#[async_trait]
impl TextClassifier for HfInferenceClient {
    #[instrument(skip(self, texts), fields(batch_len = texts.len()))]
    async fn classify_binary(&self, texts: &[String]) -> BinaryBatch {
        if texts.is_empty() {
            return BinaryBatch {
                flags: Vec::new(),
                failure: None,
            };
        }

        match self.query_endpoint(BINARY_ENDPOINT, texts).await {
            Ok(top_labels) => {
                let flags = top_labels
                    .iter()
                    .map(|ls| ls.label.to_lowercase() == RELEVANT_LABEL)
                    .collect();
                debug!("Binary relevance batch classified");
                BinaryBatch {
                    flags,
                    failure: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Binary relevance batch failed, treating all items as not relevant");
                BinaryBatch::failed(texts.len(), e.to_string())
            }
        }
    }

    #[instrument(skip(self, texts), fields(batch_len = texts.len(), model = ?model))]
    async fn classify_multiclass(
        &self,
        texts: &[String],
        model: Option<ClassifierModelId>,
    ) -> CategoryBatch {
        if texts.is_empty() {
            return CategoryBatch {
                predictions: Vec::new(),
                failure: None,
            };
        }

        let model = model.unwrap_or_default();

        match self.query_endpoint(model.endpoint(), texts).await {
            Ok(top_labels) => {
                let predictions = top_labels
                    .into_iter()
                    .map(|ls| CategoryPrediction {
                        label: ls.label.to_lowercase(),
                        score: ls.score,
                    })
                    .collect();
                debug!("Multiclass category batch classified");
                CategoryBatch {
                    predictions,
                    failure: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Multiclass batch failed, substituting error placeholders");
                CategoryBatch::failed(texts.len(), e.to_string())
            }
        }
    }
}
