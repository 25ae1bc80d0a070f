//! Diagnostic resolution route handler

use crate::{
    api_handler::{convert_resolution, ApiError, LoginQuery, ResolveResponse},
    middleware::RequestId,
    AppState,
};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// GET /v1/resolve?login=user@example.com
///
/// Runs the same resolution as `/route` but answers with JSON describing the
/// provider, the stage that matched and the redirect target, instead of
/// redirecting.
#[instrument(skip_all, fields(request_id = %request_id.0))]
pub async fn resolve_handler(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<LoginQuery>,
) -> Response {
    let login = query.login.unwrap_or_default();
    let masked = state.privacy.mask_login(&login);

    let start_time = std::time::Instant::now();

    let resolution = match state.pipeline.resolve(&login).await {
        Ok(resolution) => resolution,
        Err(e) => {
            let err = ApiError::from(e);
            warn!("Rejected login {}: {}", masked, err);
            return err.into_json_response(request_id.0);
        }
    };

    let processing_time = start_time.elapsed();
    debug!("Resolution completed in {:?}", processing_time);

    let response: ResolveResponse =
        convert_resolution(resolution, &login, request_id.0, processing_time);

    info!(
        "Resolved {} -> {} ({}, {}ms)",
        masked, response.provider, response.stage, response.elapsed_ms
    );

    Json(response).into_response()
}
