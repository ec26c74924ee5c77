//! Client-facing request hygiene: a non-empty body must declare
//! `content-type: application/json`, checked before the body is ever
//! touched by a handler.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use duel_core::error::DuelError;
use duel_trust::http::error_response;

pub async fn require_json_content_type(request: Request, next: Next) -> Response {
    let has_body = request
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|len| len > 0)
        .unwrap_or(false);

    if has_body {
        let declares_json = request
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);
        if !declares_json {
            return error_response(&DuelError::invalid("content-type must be application/json"));
        }
    }

    next.run(request).await
}
