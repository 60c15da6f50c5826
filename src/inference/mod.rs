// ABOUTME: Text classification abstraction for the review relevance and category cascade
// ABOUTME: Defines the model registry and the fail-safe batch outcome contracts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

/// Hugging Face Inference API client
pub mod huggingface;

use serde::{Deserialize, Serialize};

/// Label the binary relevance model emits for security-relevant comments
pub const RELEVANT_LABEL: &str = "relevante";

/// Category label substituted when a multiclass batch fails
pub const ERROR_CATEGORY: &str = "error";

/// Hosted endpoint of the binary relevance filter
pub const BINARY_ENDPOINT: &str =
    "https://ynswkvrvxjtqrmzq.us-east-1.aws.endpoints.huggingface.cloud";

/// Multiclass classifier selection
///
/// Closed set of deployed fine-tunes. Unknown names are rejected at
/// deserialization instead of being forwarded to the inference backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierModelId {
    /// BETO fine-tune, the default multiclass backend
    #[default]
    Beto,
    /// RoBERTuito fine-tune trained on social-media Spanish
    Robertuito,
}

impl ClassifierModelId {
    /// Hosted endpoint serving this model
    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::Beto => "https://pjurrmuzbnafdsuq.us-east-1.aws.endpoints.huggingface.cloud",
            Self::Robertuito => "https://uprmkzmcvdksjzyn.us-east-1.aws.endpoints.huggingface.cloud",
        }
    }

    /// Base model the fine-tune started from
    #[must_use]
    pub const fn base_model(&self) -> &'static str {
        match self {
            Self::Beto => "dccuchile/bert-base-spanish-wwm-cased",
            Self::Robertuito => "pysentimiento/robertuito-base-cased",
        }
    }

    /// Human-readable description for registry listings
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Beto => "BETO fine-tuned on ISO 25010 security categories",
            Self::Robertuito => "RoBERTuito fine-tuned on ISO 25010 security categories",
        }
    }

    /// Registry identifier as it appears on the wire
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beto => "beto",
            Self::Robertuito => "robertuito",
        }
    }

    /// All registered models
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::Beto, Self::Robertuito]
    }
}

/// Security categories the multiclass models can emit
pub const SECURITY_CATEGORIES: [&str; 6] = [
    "autenticidad",
    "confidencialidad",
    "integridad",
    "no_repudio",
    "resistencia",
    "responsabilidad",
];

/// Single multiclass prediction: category label plus model confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPrediction {
    /// Predicted ISO 25010 security category, or `"error"` on batch failure
    pub label: String,
    /// Model confidence in `[0.0, 1.0]`
    pub score: f64,
}

impl CategoryPrediction {
    /// Placeholder prediction emitted for every item of a failed batch
    #[must_use]
    pub fn failed() -> Self {
        Self {
            label: ERROR_CATEGORY.to_owned(),
            score: 0.0,
        }
    }
}

/// Outcome of one binary relevance batch
///
/// `flags` always has exactly one entry per input text. A failed batch
/// reports all-false flags with the failure recorded for observability.
#[derive(Debug, Clone)]
pub struct BinaryBatch {
    /// Relevance flag per input, in input order
    pub flags: Vec<bool>,
    /// Failure description when the backend call did not succeed
    pub failure: Option<String>,
}

impl BinaryBatch {
    /// All-false outcome for a failed batch of `len` texts
    #[must_use]
    pub fn failed(len: usize, reason: String) -> Self {
        Self {
            flags: vec![false; len],
            failure: Some(reason),
        }
    }
}

/// Outcome of one multiclass categorization batch
///
/// `predictions` always has exactly one entry per input text. A failed
/// batch reports `("error", 0.0)` placeholders with the failure recorded.
#[derive(Debug, Clone)]
pub struct CategoryBatch {
    /// Category prediction per input, in input order
    pub predictions: Vec<CategoryPrediction>,
    /// Failure description when the backend call did not succeed
    pub failure: Option<String>,
}

impl CategoryBatch {
    /// All-placeholder outcome for a failed batch of `len` texts
    #[must_use]
    pub fn failed(len: usize, reason: String) -> Self {
        Self {
            predictions: vec![CategoryPrediction::failed(); len],
            failure: Some(reason),
        }
    }
}

/// Provider seam for the two classification stages
///
/// Implementations never return `Err` for backend failures: a bad batch is
/// absorbed into the batch outcome so one failed call cannot sink a run.
#[async_trait::async_trait]
pub trait TextClassifier: Send + Sync {
    /// Classify texts as security-relevant or not
    ///
    /// Returns one flag per input text, in order.
    async fn classify_binary(&self, texts: &[String]) -> BinaryBatch;

    /// Assign a security category and confidence to each text
    ///
    /// Returns one prediction per input text, in order. `model` selects the
    /// multiclass backend; `None` uses the registry default.
    async fn classify_multiclass(
        &self,
        texts: &[String],
        model: Option<ClassifierModelId>,
    ) -> CategoryBatch;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_beto() {
        assert_eq!(ClassifierModelId::default(), ClassifierModelId::Beto);
    }

    #[test]
    fn model_id_deserializes_lowercase_names() {
        let model: ClassifierModelId = serde_json::from_str("\"robertuito\"").unwrap();
        assert_eq!(model, ClassifierModelId::Robertuito);
    }

    #[test]
    fn unknown_model_name_is_rejected() {
        let result = serde_json::from_str::<ClassifierModelId>("\"bert-large\"");
        assert!(result.is_err());
    }

    #[test]
    fn failed_binary_batch_preserves_length() {
        let batch = BinaryBatch::failed(5, "timeout".to_owned());
        assert_eq!(batch.flags.len(), 5);
        assert!(batch.flags.iter().all(|f| !f));
        assert!(batch.failure.is_some());
    }

    #[test]
    fn failed_category_batch_uses_error_placeholders() {
        let batch = CategoryBatch::failed(3, "503".to_owned());
        assert_eq!(batch.predictions.len(), 3);
        for p in &batch.predictions {
            assert_eq!(p.label, ERROR_CATEGORY);
            assert!((p.score - 0.0).abs() < f64::EPSILON);
        }
    }
}
