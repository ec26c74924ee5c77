//! Axum middleware enforcing the trust plane: a request that fails service
//! authentication is rejected before any application handler runs, per
//! spec.md §4.8's closing sentence.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use duel_core::types::ServiceName;

use crate::credentials::{ServiceCredentials, SERVICE_KEY_HEADER};

/// Layer state: the credential registry plus the set of service identities
/// permitted to call the endpoints this layer guards. Built once per router
/// and cloned (cheap, `Arc`-backed) into the middleware closure.
#[derive(Clone)]
pub struct TrustGuard {
    credentials: Arc<ServiceCredentials>,
    allowed: &'static [ServiceName],
}

impl TrustGuard {
    pub fn new(credentials: Arc<ServiceCredentials>, allowed: &'static [ServiceName]) -> Self {
        Self { credentials, allowed }
    }
}

pub async fn require_service_key(
    State(guard): State<TrustGuard>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(SERVICE_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    let Some(presented) = presented else {
        return unauthenticated();
    };

    match guard.credentials.resolve(presented) {
        Some(caller) if guard.allowed.contains(&caller) => next.run(request).await,
        Some(caller) => {
            tracing::warn!(%caller, "service credential valid but caller not in endpoint allowlist");
            forbidden()
        }
        None => unauthenticated(),
    }
}

fn unauthenticated() -> Response {
    (StatusCode::UNAUTHORIZED, "unauthenticated").into_response()
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "forbidden").into_response()
}
