//! Audit log HTTP surface. Every security-sensitive event lands on
//! `POST /internal/logs/create` (any authenticated peer may write); reads on
//! `GET /internal/logs/list` are gated by the admin flag on the
//! authenticated end user, forwarded by the gateway.

use std::sync::Arc;

use axum::extract::{Extension, Query, State};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use duel_core::error::DuelError;
use duel_core::types::{Account, ServiceName};
use duel_trust::http::error_response;
use duel_trust::{require_service_key, require_user_auth, ServiceCredentials, TrustGuard, UserAuthState};

use crate::dto::{CreateLogRequest, ListLogsQuery, LogsResponse};
use crate::service;

#[derive(Clone)]
pub struct AuditState {
    pub db: duel_db::PersistenceContext,
}

pub fn router(
    state: AuditState,
    credentials: Arc<ServiceCredentials>,
    user_auth: UserAuthState,
) -> Router {
    let write_guard = from_fn_with_state(
        TrustGuard::new(credentials.clone(), ALLOWED_WRITERS),
        require_service_key,
    );
    let read_service_guard = from_fn_with_state(
        TrustGuard::new(credentials, ALLOWED_READERS),
        require_service_key,
    );
    let read_user_guard = from_fn_with_state(user_auth, require_user_auth);

    Router::new()
        .route("/internal/logs/create", post(create_handler).layer(write_guard))
        .route(
            "/internal/logs/list",
            get(list_handler).layer(read_user_guard).layer(read_service_guard),
        )
        .with_state(state)
}

async fn create_handler(
    State(state): State<AuditState>,
    Json(req): Json<CreateLogRequest>,
) -> Response {
    match service::create(&state.db, req.action, req.actor.as_deref(), req.details.as_deref()).await {
        Ok(()) => axum::http::StatusCode::CREATED.into_response(),
        Err(e) => error_response(&e),
    }
}

async fn list_handler(
    State(state): State<AuditState>,
    Extension(caller): Extension<Account>,
    Query(query): Query<ListLogsQuery>,
) -> Response {
    if !caller.is_admin {
        return error_response(&DuelError::forbidden("admin privileges required"));
    }
    let result = if query.action.is_some() || query.actor.is_some() {
        service::search(
            &state.db,
            query.action,
            query.actor.as_deref(),
            query.offset.unwrap_or(0),
            query.limit,
        )
        .await
    } else {
        service::list(&state.db, query.offset.unwrap_or(0), query.limit).await
    };
    match result {
        Ok(entries) => Json(LogsResponse { entries }).into_response(),
        Err(e) => error_response(&e),
    }
}

pub const ALLOWED_WRITERS: &[ServiceName] = &[
    ServiceName::Gateway,
    ServiceName::Identity,
    ServiceName::Cards,
    ServiceName::Game,
    ServiceName::Leaderboard,
    ServiceName::Audit,
];

pub const ALLOWED_READERS: &[ServiceName] = &[ServiceName::Gateway];
