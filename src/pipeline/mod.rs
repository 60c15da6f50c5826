// ABOUTME: Two-stage classification cascade over scraped reviews
// ABOUTME: Binary relevance filter followed by multiclass ISO 25010 categorization

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use crate::constants::pipeline::DEFAULT_BATCH_SIZE;
use crate::errors::AppResult;
use crate::inference::{ClassifierModelId, TextClassifier};
use crate::models::{ClassifiedReview, ReviewRecord};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Round a confidence score to four decimal places
#[must_use]
pub fn round_confidence(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Classification cascade: relevance filter, then category assignment
///
/// Both stages run in fixed-size batches. Reviews dropped by the relevance
/// filter never reach the multiclass stage, and an empty survivor set
/// short-circuits the cascade without a single multiclass call.
pub struct CascadeFilter {
    classifier: Arc<dyn TextClassifier>,
    batch_size: usize,
}

impl CascadeFilter {
    /// Create a cascade over the given classifier with the default batch size
    #[must_use]
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self {
            classifier,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Direct access to the underlying classifier for single-item flows
    #[must_use]
    pub fn classifier(&self) -> &Arc<dyn TextClassifier> {
        &self.classifier
    }

    /// Override the batch size (zero falls back to the default)
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = if batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        };
        self
    }

    /// Run the full cascade over a set of reviews
    ///
    /// Returns the security-relevant reviews with their assigned category and
    /// confidence, preserving input order. Backend batch failures are absorbed
    /// by the classifier's fail-safe contract and logged here, so a bad batch
    /// shrinks the result instead of failing the run.
    ///
    /// # Errors
    ///
    /// Currently infallible in practice; the `Result` return leaves room for
    /// classifier implementations with hard preconditions.
    pub async fn filter_and_classify(
        &self,
        reviews: &[ReviewRecord],
        model: Option<ClassifierModelId>,
    ) -> AppResult<Vec<ClassifiedReview>> {
        if reviews.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            total = reviews.len(),
            batch_size = self.batch_size,
            "Starting relevance filter"
        );

        let texts: Vec<String> = reviews.iter().map(|r| r.text.clone()).collect();

        let mut flags = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let batch = self.classifier.classify_binary(chunk).await;
            if let Some(reason) = &batch.failure {
                warn!(
                    batch_len = chunk.len(),
                    reason, "Relevance batch failed, items treated as not relevant"
                );
            }
            flags.extend(batch.flags);
        }

        let survivors: Vec<&ReviewRecord> = reviews
            .iter()
            .zip(&flags)
            .filter_map(|(review, &relevant)| relevant.then_some(review))
            .collect();

        info!(
            relevant = survivors.len(),
            discarded = reviews.len() - survivors.len(),
            "Relevance filter complete"
        );

        if survivors.is_empty() {
            debug!("No relevant reviews, skipping category stage");
            return Ok(Vec::new());
        }

        let survivor_texts: Vec<String> = survivors.iter().map(|r| r.text.clone()).collect();

        let mut predictions = Vec::with_capacity(survivor_texts.len());
        for chunk in survivor_texts.chunks(self.batch_size) {
            let batch = self.classifier.classify_multiclass(chunk, model).await;
            if let Some(reason) = &batch.failure {
                warn!(
                    batch_len = chunk.len(),
                    reason, "Category batch failed, items carry error placeholders"
                );
            }
            predictions.extend(batch.predictions);
        }

        let classified: Vec<ClassifiedReview> = survivors
            .into_iter()
            .zip(predictions)
            .map(|(review, prediction)| ClassifiedReview {
                review: review.clone(),
                category: prediction.label,
                confidence: round_confidence(prediction.score),
            })
            .collect();

        info!(
            classified = classified.len(),
            "Category assignment complete"
        );

        Ok(classified)
    }

    /// Count classified reviews per category
    #[must_use]
    pub fn category_distribution(classified: &[ClassifiedReview]) -> BTreeMap<String, u32> {
        let mut distribution = BTreeMap::new();
        for review in classified {
            *distribution.entry(review.category.clone()).or_insert(0) += 1;
        }
        distribution
    }
}
