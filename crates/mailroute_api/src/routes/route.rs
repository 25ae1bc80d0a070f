//! Login redirect route handler
//!
//! This is the endpoint login forms point at: it resolves the provider and
//! answers with a redirect to that provider's login page.

use crate::{
    api_handler::{redirect_location, ApiError, LoginQuery},
    AppState,
};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// GET /route?login=user@example.com
///
/// Answers `302 Found` with `Location: {provider}/index.php?login={login}`.
/// A missing or unusable login is rejected with `400` and a plain-text reason.
///
/// # Performance
/// Direct and MX matches answer within a DNS round-trip. Domains that fall
/// through to probing can take several seconds, bounded by the probe and
/// sniff timeouts.
#[instrument(skip_all)]
pub async fn route_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoginQuery>,
) -> Response {
    let login = query.login.unwrap_or_default();
    let masked = state.privacy.mask_login(&login);

    let resolution = match state.pipeline.resolve(&login).await {
        Ok(resolution) => resolution,
        Err(e) => {
            let err = ApiError::from(e);
            warn!("Rejected login {}: {}", masked, err);
            return err.into_plain_response();
        }
    };

    let location = redirect_location(&resolution.provider, &login);
    info!(
        "Routing {} -> {} ({})",
        masked, resolution.provider, resolution.stage
    );

    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
