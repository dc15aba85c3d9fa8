//! Request ID middleware for log correlation.
//!
//! Reuses an inbound `x-request-id` when present, otherwise generates one,
//! runs the request inside a tracing span carrying it, and echoes it back.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound request ID accepted verbatim
const MAX_REQUEST_ID_LEN: usize = 128;

fn get_or_generate_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Middleware tagging every request and response with a request ID
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = get_or_generate_request_id(request.headers());
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;

    span.in_scope(|| {
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_request_id_is_reused() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("test-id-123"));

        assert_eq!(get_or_generate_request_id(&headers), "test-id-123");
    }

    #[test]
    fn test_request_id_generated_when_missing_or_oversized() {
        let request_id = get_or_generate_request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&request_id).is_ok());

        let mut headers = HeaderMap::new();
        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&long).unwrap());
        assert!(Uuid::parse_str(&get_or_generate_request_id(&headers)).is_ok());
    }
}
