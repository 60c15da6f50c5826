// ABOUTME: Health and readiness route handlers for monitoring infrastructure
// ABOUTME: Readiness exercises the cache backend so degraded instances get drained

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Flash Elicit

use crate::resources::ServerResources;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .with_state(resources)
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn ready_handler(
    State(resources): State<Arc<ServerResources>>,
) -> Json<serde_json::Value> {
    let cache_healthy = resources.cache.health_check().await.is_ok();

    Json(serde_json::json!({
        "status": if cache_healthy { "ready" } else { "degraded" },
        "cache": if cache_healthy { "ok" } else { "unavailable" },
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
