// ABOUTME: Chat completion abstraction for the requirement generation backend
// ABOUTME: Provider-agnostic message and request types with an async provider seam
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

/// OpenRouter chat completion provider
pub mod openrouter;
/// Prompt construction for requirement synthesis
pub mod prompts;

use crate::errors::AppResult;
use serde::{Deserialize, Serialize};

/// Role of a chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions framing the task
    System,
    /// End-user content
    User,
    /// Model-generated content
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Single message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation messages in order
    pub messages: Vec<ChatMessage>,
    /// Model override; `None` uses the provider default
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Completion token ceiling
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a request with default sampling parameters
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion token ceiling
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token accounting reported by a provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion
    pub completion_tokens: u32,
    /// Prompt plus completion
    pub total_tokens: u32,
}

/// Chat completion response
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated text
    pub content: String,
    /// Model that served the request
    pub model: String,
    /// Token accounting when the provider reports it
    pub usage: Option<TokenUsage>,
    /// Provider finish reason, e.g. `stop` or `length`
    pub finish_reason: Option<String>,
}

/// Provider seam for chat completion backends
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider identifier for logs
    fn name(&self) -> &'static str;

    /// Model used when a request does not specify one
    fn default_model(&self) -> &'static str;

    /// Execute a chat completion request
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, authentication failure, or an
    /// unparseable provider response
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse>;
}
