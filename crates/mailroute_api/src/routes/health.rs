//! Health check and monitoring routes

use crate::AppState;
use axum::{extract::State, response::Json};
use mailroute_core::pipeline::PipelineStats;
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint - GET /health
///
/// Does not touch the network; the pipeline has no readiness dependencies.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Rule statistics response
#[derive(Serialize)]
pub struct RulesResponse {
    pub version: String,
    pub pipeline_stats: PipelineStats,
}

/// Rule statistics endpoint - GET /admin/rules
pub async fn rules_handler(State(state): State<Arc<AppState>>) -> Json<RulesResponse> {
    Json(RulesResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        pipeline_stats: state.pipeline.get_stats(),
    })
}
