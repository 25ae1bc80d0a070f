//! API Routes Module
//!
//! This module organizes all HTTP endpoints into logical groups:
//! - `route`: Login redirect endpoint used by webmail login forms
//! - `resolve`: JSON diagnostic endpoint exposing the resolution
//! - `health`: Health checks and rule statistics

pub mod health;
pub mod resolve;
pub mod route;

use crate::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Build all API routes and return a configured Router
///
/// This function sets up all the application routes with their handlers
/// and applies the shared application state.
pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Login redirect
        .route("/route", get(route::route_handler))
        // Diagnostic resolution
        .route("/v1/resolve", get(resolve::resolve_handler))
        // Health and monitoring endpoints
        .route("/health", get(health::health_handler))
        .route("/admin/rules", get(health::rules_handler))
        // Apply shared state to all routes
        .with_state(state)
}
