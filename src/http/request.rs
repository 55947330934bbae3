//! Request identification.
//!
//! # Responsibilities
//! - Give every request an `x-request-id` (UUID v4 unless the client sent one)
//! - Open a span per request carrying that id so handler logs correlate
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The id is echoed on the response

use axum::body::Body;
use axum::http::{HeaderName, Request};
use tracing::Span;

pub const X_REQUEST_ID: &str = "x-request-id";

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Span factory for `TraceLayer::make_span_with`.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "admin_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
