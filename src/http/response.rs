//! Caller-response construction.
//!
//! # Responsibilities
//! - Relay a backend response (status + content type + streamed body)
//! - Produce the `{"error": "..."}` bodies used by every failure path
//!
//! # Design Decisions
//! - Backend bodies are streamed through, never buffered
//! - Only the content type is propagated from backend headers; a missing
//!   one falls back to a strategy-specific default

use axum::body::Body;
use axum::http::response::Parts;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Relay a backend response to the caller.
///
/// Status is propagated as-is; the content type is the backend's if it
/// sent one, else `fallback_content_type`. The body streams through.
pub fn relay_response(parts: Parts, body: Body, fallback_content_type: &'static str) -> Response {
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(fallback_content_type));

    let mut response = Response::new(body);
    *response.status_mut() = parts.status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    response
}

/// Build a JSON error response of the shape `{"error": "<message>"}`.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string();
    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        body,
    )
        .into_response()
}
