// ABOUTME: OpenRouter chat completion provider using the OpenAI-compatible API
// ABOUTME: Default backend for requirement synthesis (x-ai/grok-4-fast)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{ChatMessage, ChatProvider, ChatRequest, ChatResponse, TokenUsage};
use crate::errors::{AppError, AppResult};

/// Environment variable for the OpenRouter API key
const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Default model for requirement synthesis
const DEFAULT_MODEL: &str = "x-ai/grok-4-fast";

/// Base URL for the OpenRouter API (OpenAI-compatible)
const API_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Referer reported to OpenRouter for request attribution
const HTTP_REFERER: &str = "https://flash-elicit.app";

/// Application title reported to OpenRouter
const APP_TITLE: &str = "Flash Elicit";

/// OpenRouter request structure (OpenAI-compatible)
#[derive(Debug, Serialize)]
struct OpenRouterRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Message structure for the OpenRouter API
#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

/// OpenRouter response structure (OpenAI-compatible)
#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// OpenRouter API error response
#[derive(Debug, Deserialize)]
struct WireErrorResponse {
    error: WireErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

/// OpenRouter chat completion provider
///
/// Routes requests through OpenRouter's OpenAI-compatible gateway, which
/// fronts the Grok model family used for requirement synthesis.
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
}

impl OpenRouterProvider {
    /// Create a new provider with the given API key
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Create a provider from environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENROUTER_API_KEY` is not set
    pub fn from_env() -> AppResult<Self> {
        let api_key = std::env::var(OPENROUTER_API_KEY_ENV).map_err(|_| {
            AppError::config(format!(
                "Missing {OPENROUTER_API_KEY_ENV} environment variable"
            ))
        })?;

        Ok(Self::new(api_key))
    }

    fn api_url(endpoint: &str) -> String {
        format!("{API_BASE_URL}/{endpoint}")
    }

    fn convert_messages(messages: &[ChatMessage]) -> Vec<WireMessage> {
        messages.iter().map(WireMessage::from).collect()
    }

    /// Parse error response from the OpenRouter API
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        if let Ok(error_response) = serde_json::from_str::<WireErrorResponse>(body) {
            match status.as_u16() {
                401 => AppError::external_auth(
                    "OpenRouter",
                    format!("Authentication failed: {}", error_response.error.message),
                ),
                429 => AppError::external_rate_limited(
                    "OpenRouter",
                    format!("Rate limit exceeded: {}", error_response.error.message),
                ),
                400 => AppError::invalid_input(format!(
                    "OpenRouter validation error: {}",
                    error_response.error.message
                )),
                _ => AppError::external_service(
                    "OpenRouter",
                    format!(
                        "{} (code {:?})",
                        error_response.error.message, error_response.error.code
                    ),
                ),
            }
        } else {
            AppError::external_service(
                "OpenRouter",
                format!(
                    "API error ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            )
        }
    }
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(DEFAULT_MODEL)))]
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_MODEL);

        debug!("Sending chat completion request to OpenRouter");

        let wire_request = OpenRouterRequest {
            model: model.to_owned(),
            messages: Self::convert_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(Self::api_url("chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", HTTP_REFERER)
            .header("X-Title", APP_TITLE)
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to OpenRouter API: {}", e);
                AppError::external_service("OpenRouter", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read OpenRouter API response: {}", e);
            AppError::external_service("OpenRouter", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let wire_response: OpenRouterResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse OpenRouter API response: {}", e);
            AppError::external_service("OpenRouter", format!("Failed to parse response: {e}"))
        })?;

        let choice = wire_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("OpenRouter", "API returned no choices"))?;

        let content = choice.message.content.unwrap_or_default();

        debug!(
            "Received response from OpenRouter: {} chars, finish_reason: {:?}",
            content.len(),
            choice.finish_reason
        );

        Ok(ChatResponse {
            content,
            model: wire_response.model,
            usage: wire_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}
