// ABOUTME: Analysis flows: bulk scrape-classify-synthesize and single-comment triage
// ABOUTME: Memoizes full responses behind deterministic request-derived cache keys

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use crate::cache::CacheKey;
use crate::constants::cache::{TTL_SCRAPE_SECS, TTL_SINGLE_COMMENT_SECS};
use crate::errors::AppResult;
use crate::inference::ClassifierModelId;
use crate::models::{ClassifiedReview, Requirement, RequirementsDocument};
use crate::pipeline::{round_confidence, CascadeFilter};
use crate::resources::ServerResources;
use crate::scraper::{ScrapeStats, SortOrder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Parameters of a bulk analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisJob {
    /// Store identifier, e.g. `com.bcp.bank.bcp`
    pub app_id: String,
    /// Maximum number of negative reviews to collect
    pub max_reviews: usize,
    /// Rating ceiling; reviews above it are dropped
    pub max_rating: u8,
    /// Review ordering
    pub sort: SortOrder,
    /// Multiclass model selection
    pub model: Option<ClassifierModelId>,
}

/// Pipeline statistics reported with a bulk analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Collection-stage statistics
    #[serde(flatten)]
    pub scraping: ScrapeStats,
    /// Reviews entering the relevance filter
    #[serde(rename = "comentarios_antes_filtro")]
    pub pre_filter_count: usize,
    /// Reviews surviving the relevance filter
    #[serde(rename = "comentarios_relevantes")]
    pub relevant_count: usize,
    /// Survivors over collected, rounded to four decimals; zero when nothing
    /// was collected
    #[serde(rename = "tasa_relevancia")]
    pub relevance_rate: f64,
    /// Classified review count per category
    #[serde(rename = "distribucion_categorias")]
    pub category_distribution: BTreeMap<String, u32>,
}

/// Response of a bulk analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Whether the pipeline ran to completion
    pub success: bool,
    /// Analyzed application
    pub app_id: String,
    /// Number of classified reviews returned
    pub total_reviews: usize,
    /// Classified reviews in scrape order
    pub reviews: Vec<ClassifiedReview>,
    /// Pipeline statistics
    pub stats: AnalysisStats,
    /// Generated requirements; absent when synthesis failed outright
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<RequirementsDocument>,
}

/// Outcome of classifying a single comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleCommentOutcome {
    /// Whether the triage ran to completion
    pub success: bool,
    /// Relevance filter verdict
    pub es_relevante: bool,
    /// Human-readable result description
    pub mensaje: String,
    /// Echo of the analyzed comment
    pub comentario: String,
    /// Echo of the star rating
    pub calificacion: u8,
    /// Assigned category, present only for relevant comments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
    /// Classification confidence, four decimals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confianza: Option<f64>,
    /// Generated requirement, absent when generation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requisito: Option<Requirement>,
    /// Generation failure description, when generation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Orchestrates the analysis flows over the shared resources
#[derive(Clone)]
pub struct AnalysisService {
    resources: Arc<ServerResources>,
}

impl AnalysisService {
    /// Create a service over the shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Best-effort cache read; errors degrade to a miss
    async fn cache_get<T: for<'de> Deserialize<'de>>(&self, key: &CacheKey) -> Option<T> {
        match self.resources.cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Best-effort cache write; errors are logged and dropped
    async fn cache_put<T: Serialize + Send + Sync>(&self, key: &CacheKey, value: &T, ttl_secs: u64) {
        if let Err(e) = self
            .resources
            .cache
            .set(key, value, Duration::from_secs(ttl_secs))
            .await
        {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    /// Run the full pipeline: scrape, filter, classify, synthesize
    ///
    /// Synthesis failure does not fail the run; the response then carries the
    /// classified reviews without a requirements document.
    ///
    /// # Errors
    ///
    /// Returns an error when review collection fails before the first page
    pub async fn analyze_app(&self, job: &AnalysisJob) -> AppResult<AnalysisResponse> {
        let cache_key = CacheKey::from_payload("scrape", job)?;
        if let Some(cached) = self.cache_get::<AnalysisResponse>(&cache_key).await {
            info!(app_id = %job.app_id, "Returning cached analysis");
            return Ok(cached);
        }

        let config = &self.resources.config.scraper;
        let outcome = self
            .resources
            .scraper
            .scrape_negative_reviews(
                &job.app_id,
                job.max_reviews,
                job.max_rating,
                job.sort,
                &config.lang,
                &config.country,
            )
            .await?;

        info!(
            app_id = %job.app_id,
            collected = outcome.total_found,
            "Collection finished, starting classification"
        );

        let classified = self
            .resources
            .cascade
            .filter_and_classify(&outcome.reviews, job.model)
            .await?;

        let requirements = match self.resources.synthesizer.generate_requirements(&classified).await
        {
            Ok(document) => Some(document),
            Err(e) => {
                warn!(error = %e, "Requirement synthesis failed, continuing without requirements");
                None
            }
        };

        let relevance_rate = if outcome.total_found == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            round_confidence(classified.len() as f64 / outcome.total_found as f64)
        };

        let response = AnalysisResponse {
            success: true,
            app_id: job.app_id.clone(),
            total_reviews: classified.len(),
            stats: AnalysisStats {
                scraping: outcome.stats,
                pre_filter_count: outcome.total_found,
                relevant_count: classified.len(),
                relevance_rate,
                category_distribution: CascadeFilter::category_distribution(&classified),
            },
            reviews: classified,
            requirements,
        };

        self.cache_put(&cache_key, &response, TTL_SCRAPE_SECS).await;

        Ok(response)
    }

    /// Triage one comment: relevance filter, then category, then one requirement
    ///
    /// A not-relevant verdict short-circuits the flow; neither the multiclass
    /// model nor the generator is called. A generation failure is a partial
    /// success carrying the classification with an error description.
    ///
    /// # Errors
    ///
    /// Currently infallible in practice; kept fallible for cache key
    /// construction
    pub async fn classify_single_comment(
        &self,
        comment: &str,
        rating: u8,
        model: Option<ClassifierModelId>,
    ) -> AppResult<SingleCommentOutcome> {
        let cache_payload = serde_json::json!({
            "comentario": comment,
            "calificacion": rating,
            "multiclass_model": model,
        });
        let cache_key = CacheKey::from_payload("single_comment", &cache_payload)?;
        if let Some(cached) = self.cache_get::<SingleCommentOutcome>(&cache_key).await {
            info!("Returning cached single-comment outcome");
            return Ok(cached);
        }

        let texts = vec![comment.to_owned()];
        let binary = self.resources.cascade.classifier().classify_binary(&texts).await;
        let is_relevant = binary.flags.first().copied().unwrap_or(false);

        if !is_relevant {
            let outcome = SingleCommentOutcome {
                success: true,
                es_relevante: false,
                mensaje: "El comentario no fue clasificado como relevante para requisitos de \
                          seguridad según ISO 25010. No se generó ningún requisito."
                    .to_owned(),
                comentario: comment.to_owned(),
                calificacion: rating,
                categoria: None,
                confianza: None,
                requisito: None,
                error: None,
            };
            self.cache_put(&cache_key, &outcome, TTL_SINGLE_COMMENT_SECS)
                .await;
            return Ok(outcome);
        }

        let category_batch = self
            .resources
            .cascade
            .classifier()
            .classify_multiclass(&texts, model)
            .await;
        let prediction = category_batch
            .predictions
            .into_iter()
            .next()
            .unwrap_or_else(crate::inference::CategoryPrediction::failed);
        let confidence = round_confidence(prediction.score);

        let (requirement, error) = match self
            .resources
            .synthesizer
            .generate_single_requirement(comment, &prediction.label, confidence, rating)
            .await
        {
            Ok(requirement) => (Some(requirement), None),
            Err(e) => {
                warn!(error = %e, "Single requirement generation failed");
                (None, Some(e.to_string()))
            }
        };

        let outcome = SingleCommentOutcome {
            success: true,
            es_relevante: true,
            mensaje: format!(
                "Comentario clasificado como relevante en la categoría '{}' con {:.2}% de confianza.",
                prediction.label,
                confidence * 100.0
            ),
            comentario: comment.to_owned(),
            calificacion: rating,
            categoria: Some(prediction.label),
            confianza: Some(confidence),
            requisito: requirement,
            error,
        };

        // Partial successes are cached too; retrying the generator on the
        // same comment within the TTL rarely changes the outcome
        self.cache_put(&cache_key, &outcome, TTL_SINGLE_COMMENT_SECS)
            .await;

        Ok(outcome)
    }
}
