//! Ingress gateway: the single client-facing entry point. Terminates HTTPS,
//! enforces the body-size cap and content-type rule, then forwards every
//! request to the internal service that owns it. Holds no database handle
//! and authenticates nothing itself beyond attaching its own service
//! credential to the outbound hop.

pub mod config;
pub mod dto;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod tls;

use axum::Router;
use duel_core::constants::MAX_REQUEST_BODY_BYTES;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use config::GatewayConfig;
pub use routes::GatewayState;

/// Builds the full gateway router, with the body-size cap and request
/// tracing applied outermost so they run before any route-specific logic.
/// CORS is permissive, matching a gateway whose only real access control is
/// the bearer token every downstream service checks for itself.
pub fn app(state: GatewayState) -> Router {
    let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
}
