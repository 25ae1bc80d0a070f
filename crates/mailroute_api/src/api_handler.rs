//! Shared API types and utilities
//!
//! This module contains common types, error handling, and conversion utilities
//! used across all API endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use mailroute_core::{InvalidAddress, ProviderId, Resolution, RouteError, Stage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Query parameters for routing a login
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Login identifier, expected to look like an email address
    pub login: Option<String>,
}

/// API response for a resolution
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    /// Request ID for tracking
    pub request_id: String,
    /// Resolved provider
    pub provider: ProviderId,
    /// Stage that produced the provider
    pub stage: Stage,
    /// Normalized domain of the login
    pub domain: String,
    /// Redirect target `/route` would send the caller to
    pub location: String,
    /// Total processing time in milliseconds
    pub elapsed_ms: u64,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    pub request_id: String,
    pub timestamp: String,
}

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidAddress(InvalidAddress),
    #[error("{0}")]
    InternalError(String),
}

impl From<RouteError> for ApiError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::InvalidAddress(reason) => ApiError::InvalidAddress(reason),
            RouteError::Configuration(msg) => ApiError::InternalError(msg),
            RouteError::Internal(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidAddress(InvalidAddress::MissingParameter) => "MISSING_PARAMETER",
            ApiError::InvalidAddress(InvalidAddress::InvalidEmail) => "INVALID_EMAIL",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Plain-text body used by the redirect endpoint
    pub fn plain_message(&self) -> &'static str {
        match self {
            ApiError::InvalidAddress(InvalidAddress::MissingParameter) => "Missing login parameter.",
            ApiError::InvalidAddress(InvalidAddress::InvalidEmail) => "Invalid email address.",
            ApiError::InternalError(_) => "Internal server error.",
        }
    }

    /// Plain-text rejection for the redirect endpoint
    pub fn into_plain_response(self) -> Response {
        (self.status(), self.plain_message()).into_response()
    }

    /// JSON rejection carrying the caller's request ID
    pub fn into_json_response(self, request_id: String) -> Response {
        let error_response = ErrorResponse {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (self.status(), Json(error_response)).into_response()
    }
}

/// Characters `urlencoding` escapes but a JavaScript `encodeURIComponent` keeps
const KEPT_MARKS: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

/// Build the redirect target for a provider
///
/// The login is percent-encoded as a single query component, leaving the
/// unreserved marks `!'()*` as they are so links match those built by
/// browser-side code.
pub fn redirect_location(provider: &ProviderId, login: &str) -> String {
    let encoded = KEPT_MARKS
        .iter()
        .fold(urlencoding::encode(login).into_owned(), |acc, &(escaped, mark)| {
            acc.replace(escaped, mark)
        });
    format!("{}/index.php?login={}", provider, encoded)
}

/// Convert a core Resolution to an API response
pub fn convert_resolution(
    resolution: Resolution,
    login: &str,
    request_id: String,
    processing_time: std::time::Duration,
) -> ResolveResponse {
    ResolveResponse {
        request_id,
        location: redirect_location(&resolution.provider, login),
        provider: resolution.provider,
        stage: resolution.stage,
        domain: resolution.domain.to_string(),
        elapsed_ms: processing_time.as_millis() as u64,
    }
}
