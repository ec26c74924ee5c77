//! Shared HTTP plumbing used by every service's axum router: mapping the
//! `DuelError` taxonomy to a response body, and pulling the bearer token out
//! of an `Authorization` header.

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use duel_core::error::DuelError;
use serde::Serialize;

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Renders a `DuelError` into the JSON error body every service returns,
/// with the HTTP status the taxonomy in spec.md §7 assigns it.
pub fn error_response(err: &DuelError) -> Response {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorBody {
        error: err.category(),
        message: err.to_string(),
    };
    (status, axum::Json(body)).into_response()
}

pub fn empty_response(status: StatusCode) -> Response {
    Response::builder().status(status).body(Body::empty()).unwrap()
}

/// Extracts the bearer token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim)
}
