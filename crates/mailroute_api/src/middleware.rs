//! Request correlation middleware

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID attached to every request by [`request_id`]
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Attach a request ID to the request extensions and echo it in the response
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = extract_or_generate_request_id(request.headers());
    debug!("Processing request: {}", request_id);

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if response.status().is_client_error() {
        warn!("Client error for request {}: {}", request_id, response.status());
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Extract the caller's request ID or generate a new one
fn extract_or_generate_request_id(headers: &HeaderMap) -> String {
    ["x-trace-id", REQUEST_ID_HEADER]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .find(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_existing_request_id_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(extract_or_generate_request_id(&headers), "abc-123");

        headers.insert("x-trace-id", HeaderValue::from_static("trace-1"));
        assert_eq!(extract_or_generate_request_id(&headers), "trace-1");
    }

    #[test]
    fn test_request_id_is_generated() {
        let id = extract_or_generate_request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
