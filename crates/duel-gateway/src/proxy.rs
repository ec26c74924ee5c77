//! Generic internal-hop forwarder. Every client-facing handler in
//! `routes.rs` resolves its upstream URL and calls through here rather than
//! hand-rolling its own `reqwest` plumbing — the bearer token is relayed
//! unmodified and a fresh service-credential header is attached for this
//! specific hop, per the trust plane's "every hop carries its own
//! credential" rule.

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use duel_core::error::DuelError;
use duel_trust::http::error_response;
use duel_trust::SERVICE_KEY_HEADER;
use reqwest::Method;

#[derive(Clone)]
pub struct Proxy {
    http: reqwest::Client,
    service_key: String,
}

impl Proxy {
    pub fn new(service_key: String) -> Self {
        Self { http: reqwest::Client::new(), service_key }
    }

    /// Forwards a request to `url`, attaching the gateway's service key and,
    /// if present, the caller's bearer token. `body` is serialized as JSON
    /// when present; GETs pass `None`. The upstream's status and JSON body
    /// are relayed back verbatim — the gateway never reinterprets a peer's
    /// response, it just adds the hop's own credential on the way out.
    pub async fn send(
        &self,
        method: Method,
        url: String,
        bearer: Option<&str>,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Response {
        let mut req = self.http.request(method, &url).header(SERVICE_KEY_HEADER, &self.service_key);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => return error_response(&DuelError::unavailable(format!("upstream unreachable: {e}"))),
        };

        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return error_response(&DuelError::unavailable(format!("upstream response read failed: {e}"))),
        };

        let mut response = Response::builder().status(status).body(Body::from(bytes)).unwrap();
        response
            .headers_mut()
            .insert(axum::http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response.into_response()
    }
}
