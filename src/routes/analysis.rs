// ABOUTME: Scraping, single-comment and PDF endpoints for the analysis API
// ABOUTME: Validates requests, delegates to the service layer, maps errors to HTTP

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use crate::errors::{AppError, AppResult};
use crate::inference::ClassifierModelId;
use crate::models::{Requirement, RequirementsDocument, Summary};
use crate::report::{render_requirements_pdf, ReportContext};
use crate::resources::ServerResources;
use crate::scraper::SortOrder;
use crate::services::analysis::{
    AnalysisJob, AnalysisResponse, AnalysisService, SingleCommentOutcome,
};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

const PLAY_STORE_URL_PREFIX: &str = "https://play.google.com/store/apps/details?id=";

const fn default_max_reviews() -> usize {
    9000
}

const fn default_max_rating() -> u8 {
    3
}

const fn default_rating() -> u8 {
    1
}

/// Request body for the bulk scrape-and-analyze endpoint
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    /// Play Store details URL of the target app
    pub playstore_url: String,
    /// Maximum number of negative reviews to collect
    #[serde(default = "default_max_reviews")]
    pub max_reviews: usize,
    /// Rating ceiling; reviews above it are dropped
    #[serde(default = "default_max_rating")]
    pub max_rating: u8,
    /// Review ordering
    pub criterios_busqueda: SortOrder,
    /// Multiclass model selection; default model when absent
    #[serde(default)]
    pub multiclass_model: Option<ClassifierModelId>,
}

impl ScrapeRequest {
    /// Validate the request and extract the store app id from the URL
    ///
    /// # Errors
    ///
    /// Returns an error for non-Play-Store URLs, an unextractable app id, or
    /// an out-of-range rating ceiling
    pub fn app_id(&self) -> AppResult<String> {
        if !self.playstore_url.starts_with(PLAY_STORE_URL_PREFIX) {
            return Err(AppError::invalid_input(
                "playstore_url must be a Google Play Store details URL",
            ));
        }
        if !(1..=5).contains(&self.max_rating) {
            return Err(AppError::invalid_input("max_rating must be between 1 and 5"));
        }

        let url = url::Url::parse(&self.playstore_url)
            .map_err(|e| AppError::invalid_input(format!("playstore_url is not a valid URL: {e}")))?;

        url.query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.into_owned())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::invalid_input("Could not extract app id from playstore_url"))
    }
}

/// Request body for single-comment triage
#[derive(Debug, Deserialize)]
pub struct SingleCommentRequest {
    /// Comment text to classify
    pub comentario: String,
    /// Star rating 1-5
    #[serde(default = "default_rating")]
    pub calificacion: u8,
    /// Multiclass model selection; default model when absent
    #[serde(default)]
    pub multiclass_model: Option<ClassifierModelId>,
}

impl SingleCommentRequest {
    /// Validate the request, returning the trimmed comment
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or too-short comment, or an out-of-range
    /// rating
    pub fn validated_comment(&self) -> AppResult<&str> {
        let trimmed = self.comentario.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("El comentario no puede estar vacío"));
        }
        if trimmed.chars().count() < 10 {
            return Err(AppError::invalid_input(
                "El comentario debe tener al menos 10 caracteres",
            ));
        }
        if !(1..=5).contains(&self.calificacion) {
            return Err(AppError::invalid_input(
                "calificacion must be between 1 and 5",
            ));
        }
        Ok(trimmed)
    }
}

/// Request body for PDF generation
///
/// Carries the requirements the client received from the scrape endpoint.
/// The client also sends its copy of the summary; it is accepted for wire
/// compatibility but the rendered summary is always recomputed.
#[derive(Debug, Deserialize)]
pub struct PdfRequest {
    /// Analyzed application
    pub app_id: String,
    /// ISO 8601 generation timestamp
    pub fecha_generacion: String,
    /// Comments analyzed in the originating run
    pub total_comentarios_analizados: u64,
    /// Requirements to render, at least one
    pub requisitos: Vec<Requirement>,
    /// Client-side summary, ignored in favor of a recomputed one
    #[serde(default, rename = "resumen")]
    pub _resumen: Option<Summary>,
}

/// Analysis routes implementation
pub struct AnalysisRoutes;

impl AnalysisRoutes {
    /// Create all analysis routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/scrape", post(scrape_handler))
            .route("/classify-single", post(classify_single_handler))
            .route("/generate-pdf", post(generate_pdf_handler))
            .with_state(resources)
    }
}

async fn scrape_handler(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let app_id = request.app_id()?;

    info!(
        app_id,
        max_reviews = request.max_reviews,
        max_rating = request.max_rating,
        "Received scrape request"
    );

    let job = AnalysisJob {
        app_id,
        max_reviews: request.max_reviews,
        max_rating: request.max_rating,
        sort: request.criterios_busqueda,
        model: request.multiclass_model,
    };

    let service = AnalysisService::new(resources);
    let response = service.analyze_app(&job).await?;

    Ok(Json(response))
}

async fn classify_single_handler(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<SingleCommentRequest>,
) -> Result<Json<SingleCommentOutcome>, AppError> {
    let comment = request.validated_comment()?.to_owned();

    info!(rating = request.calificacion, "Received single-comment request");

    let service = AnalysisService::new(resources);
    let outcome = service
        .classify_single_comment(&comment, request.calificacion, request.multiclass_model)
        .await?;

    Ok(Json(outcome))
}

async fn generate_pdf_handler(
    State(_resources): State<Arc<ServerResources>>,
    Json(request): Json<PdfRequest>,
) -> Result<Response, AppError> {
    if request.app_id.trim().is_empty() {
        return Err(AppError::invalid_input("app_id must not be empty"));
    }
    if request.requisitos.is_empty() {
        return Err(AppError::invalid_input(
            "At least one requirement is needed to generate a PDF",
        ));
    }

    info!(
        app_id = %request.app_id,
        requirements = request.requisitos.len(),
        "Received PDF generation request"
    );

    let generated_at = DateTime::parse_from_rfc3339(&request.fecha_generacion)
        .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

    let document = RequirementsDocument::from_requirements(request.requisitos);
    let context = ReportContext {
        app_id: request.app_id.trim().to_owned(),
        generated_at,
        total_comments_analyzed: request.total_comentarios_analizados,
    };

    let bytes = render_requirements_pdf(&document, &context)?;
    let filename = format!("requisitos_{}.pdf", context.app_id);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrape_request(url: &str) -> ScrapeRequest {
        ScrapeRequest {
            playstore_url: url.to_owned(),
            max_reviews: default_max_reviews(),
            max_rating: default_max_rating(),
            criterios_busqueda: SortOrder::Recientes,
            multiclass_model: None,
        }
    }

    #[test]
    fn extracts_app_id_from_store_url() {
        let request = scrape_request(
            "https://play.google.com/store/apps/details?id=com.bcp.bank.bcp&hl=es",
        );
        assert_eq!(request.app_id().unwrap(), "com.bcp.bank.bcp");
    }

    #[test]
    fn rejects_non_store_urls() {
        let request = scrape_request("https://example.com/store/apps/details?id=com.x");
        assert!(request.app_id().is_err());
    }

    #[test]
    fn rejects_out_of_range_rating_ceiling() {
        let mut request = scrape_request(
            "https://play.google.com/store/apps/details?id=com.bcp.bank.bcp",
        );
        request.max_rating = 6;
        assert!(request.app_id().is_err());
    }

    #[test]
    fn comment_must_have_minimum_length() {
        let request = SingleCommentRequest {
            comentario: "  corto  ".to_owned(),
            calificacion: 1,
            multiclass_model: None,
        };
        assert!(request.validated_comment().is_err());

        let request = SingleCommentRequest {
            comentario: "No puedo iniciar sesión con mi huella".to_owned(),
            calificacion: 1,
            multiclass_model: None,
        };
        assert_eq!(
            request.validated_comment().unwrap(),
            "No puedo iniciar sesión con mi huella"
        );
    }

    #[test]
    fn scrape_request_defaults_apply() {
        let request: ScrapeRequest = serde_json::from_str(
            r#"{
                "playstore_url": "https://play.google.com/store/apps/details?id=com.x.app",
                "criterios_busqueda": "recientes"
            }"#,
        )
        .unwrap();
        assert_eq!(request.max_reviews, 9000);
        assert_eq!(request.max_rating, 3);
        assert!(request.multiclass_model.is_none());
    }
}
