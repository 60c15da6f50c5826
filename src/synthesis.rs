// ABOUTME: Non-functional requirement synthesis from classified reviews
// ABOUTME: Bounded-retry chat completion with fail-soft handling of unparseable output

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use crate::constants::synthesis::{
    BULK_MAX_TOKENS, DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUIREMENT_ID, SINGLE_MAX_TOKENS, TEMPERATURE,
};
use crate::errors::{AppError, AppResult};
use crate::llm::prompts::{build_bulk_prompt, build_single_comment_prompt};
use crate::llm::{ChatMessage, ChatProvider, ChatRequest};
use crate::models::{ClassifiedReview, Priority, Requirement, RequirementsDocument};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Wire shape of the bulk synthesis response
///
/// The model also emits a `resumen` block; it is ignored here and recomputed
/// from the parsed requirements so the counts can never disagree.
#[derive(Debug, Deserialize)]
struct BulkResponseWire {
    requisitos: Vec<Requirement>,
}

/// Wire shape of the single-comment synthesis response
#[derive(Debug, Deserialize)]
struct SingleRequirementWire {
    #[serde(default = "default_requirement_id")]
    id: String,
    categoria: String,
    requisito: String,
    prioridad: Priority,
    justificacion: String,
    #[serde(default)]
    criterios_aceptacion: Vec<String>,
    #[serde(default = "default_related_count")]
    comentarios_relacionados: u32,
}

fn default_requirement_id() -> String {
    DEFAULT_REQUIREMENT_ID.to_owned()
}

const fn default_related_count() -> u32 {
    1
}

impl From<SingleRequirementWire> for Requirement {
    fn from(wire: SingleRequirementWire) -> Self {
        Self {
            id: wire.id,
            category: wire.categoria,
            statement: wire.requisito,
            priority: wire.prioridad,
            justification: wire.justificacion,
            acceptance_criteria: wire.criterios_aceptacion,
            related_comment_count: wire.comentarios_relacionados,
        }
    }
}

/// Strip markdown code fences from a model response
///
/// Models regularly wrap the JSON payload in ```json fences despite being
/// told not to. The content between the first fence pair wins.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + "```json".len()..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
        return rest.trim();
    }
    if let Some(start) = text.find("```") {
        let rest = &text[start + "```".len()..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
        return rest.trim();
    }
    text.trim()
}

/// Outcome of a single synthesis attempt
enum AttemptOutcome<T> {
    /// Response parsed into the expected shape
    Parsed(T),
    /// Response arrived but could not be parsed; raw text kept for diagnostics
    Unparseable(String),
}

/// Requirement synthesizer over a chat completion provider
///
/// Makes up to `max_attempts` calls per operation. A response that never
/// parses is a partial success (diagnostic document), a transport failure on
/// the final attempt is a hard error.
pub struct RequirementSynthesizer {
    provider: Arc<dyn ChatProvider>,
    max_attempts: u32,
}

impl RequirementSynthesizer {
    /// Create a synthesizer with the default attempt budget
    #[must_use]
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the attempt budget (zero falls back to the default)
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = if max_attempts == 0 {
            DEFAULT_MAX_ATTEMPTS
        } else {
            max_attempts
        };
        self
    }

    /// Run one attempt: call the provider and try to parse the response
    async fn attempt<T, F>(&self, request: &ChatRequest, parse: F) -> AppResult<AttemptOutcome<T>>
    where
        F: Fn(&str) -> Option<T>,
    {
        let response = self.provider.complete(request).await?;
        let payload = strip_code_fences(&response.content);

        Ok(parse(payload).map_or_else(
            || AttemptOutcome::Unparseable(payload.to_owned()),
            AttemptOutcome::Parsed,
        ))
    }

    /// Run attempts until one parses, the parse budget is spent, or the final
    /// attempt fails in transport
    async fn run_with_retry<T, F>(&self, request: &ChatRequest, parse: F) -> AppResult<AttemptOutcome<T>>
    where
        F: Fn(&str) -> Option<T>,
    {
        let mut last_raw = String::new();

        for attempt in 1..=self.max_attempts {
            match self.attempt(request, &parse).await {
                Ok(AttemptOutcome::Parsed(value)) => return Ok(AttemptOutcome::Parsed(value)),
                Ok(AttemptOutcome::Unparseable(raw)) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        "Model response did not parse as JSON"
                    );
                    last_raw = raw;
                }
                Err(e) => {
                    if attempt == self.max_attempts {
                        return Err(AppError::external_service(
                            self.provider.name(),
                            format!("Synthesis failed after {} attempts: {e}", self.max_attempts),
                        ));
                    }
                    warn!(attempt, error = %e, "Synthesis attempt failed, retrying");
                }
            }
        }

        Ok(AttemptOutcome::Unparseable(last_raw))
    }

    /// Generate requirements for a set of classified reviews
    ///
    /// An empty input returns a diagnostic document without any provider
    /// call. A response that never parses returns a document carrying the
    /// raw model output for inspection.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider fails in transport on the final
    /// attempt
    pub async fn generate_requirements(
        &self,
        reviews: &[ClassifiedReview],
    ) -> AppResult<RequirementsDocument> {
        if reviews.is_empty() {
            return Ok(RequirementsDocument::failure(
                "No hay comentarios clasificados para procesar",
                None,
            ));
        }

        info!(total = reviews.len(), "Generating requirements");

        let prompt = build_bulk_prompt(reviews);
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(TEMPERATURE)
            .with_max_tokens(BULK_MAX_TOKENS);

        let outcome = self
            .run_with_retry(&request, |payload| {
                serde_json::from_str::<BulkResponseWire>(payload).ok()
            })
            .await?;

        match outcome {
            AttemptOutcome::Parsed(wire) => {
                let document = RequirementsDocument::from_requirements(wire.requisitos);
                info!(
                    total = document.summary.total_requirements,
                    "Requirements generated"
                );
                Ok(document)
            }
            AttemptOutcome::Unparseable(raw) => Ok(RequirementsDocument::failure(
                "No se pudo parsear la respuesta del modelo",
                Some(raw),
            )),
        }
    }

    /// Generate exactly one requirement for a single classified comment
    ///
    /// # Errors
    ///
    /// Returns an error when the provider fails in transport on the final
    /// attempt, or when the response never parses
    pub async fn generate_single_requirement(
        &self,
        comment: &str,
        category: &str,
        confidence: f64,
        rating: u8,
    ) -> AppResult<Requirement> {
        info!(category, confidence, "Generating single requirement");

        let prompt = build_single_comment_prompt(comment, category, confidence, rating);
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(TEMPERATURE)
            .with_max_tokens(SINGLE_MAX_TOKENS);

        let outcome = self
            .run_with_retry(&request, |payload| {
                serde_json::from_str::<SingleRequirementWire>(payload).ok()
            })
            .await?;

        match outcome {
            AttemptOutcome::Parsed(wire) => Ok(Requirement::from(wire)),
            AttemptOutcome::Unparseable(raw) => Err(AppError::external_service(
                self.provider.name(),
                format!(
                    "Model response did not parse as a requirement: {}",
                    raw.chars().take(200).collect::<String>()
                ),
            )),
        }
    }
}
