// ABOUTME: HTTP server assembly: router, CORS, tracing and request limits
// ABOUTME: Binds the configured port and serves until the process is stopped

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;
use crate::routes::analysis::AnalysisRoutes;
use crate::routes::health::HealthRoutes;
use axum::http::{header::HeaderName, HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Request body ceiling; PDF payloads with large requirement sets stay well
/// under this
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Whole-request timeout; bulk runs page the store and call two models
const REQUEST_TIMEOUT_SECS: u64 = 600;

/// Configure CORS from the resolved origin list
///
/// An empty list or a lone `*` entry allows any origin; anything else becomes
/// an explicit allow list.
fn setup_cors(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
            .collect();
        if parsed.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(parsed)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}

/// Build the application router over the shared resources
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config.cors_origins);

    Router::new()
        .nest("/api/scraping", AnalysisRoutes::routes(resources.clone()))
        .nest("/api", HealthRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Complete in-flight requests on SIGINT instead of dropping them
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install shutdown handler");
        return;
    }
    info!("Shutdown signal received");
}

/// Bind the configured port and serve until shutdown
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails
pub async fn serve(resources: Arc<ServerResources>) -> AppResult<()> {
    let port = resources.config.http_port;
    let router = build_router(resources);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind port {port}: {e}")))?;

    info!(port, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}
