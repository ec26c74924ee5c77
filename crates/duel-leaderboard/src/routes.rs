//! Leaderboard / reporting HTTP surface. Every read requires an end-user
//! access token (forwarded by the gateway); visibility mutation requires
//! the caller to be acting on their own account.

use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use duel_core::types::{Account, ServiceName};
use duel_trust::http::error_response;
use duel_trust::{require_service_key, require_user_auth, ServiceCredentials, TrustGuard, UserAuthState};

use crate::dto::{
    AggregateStatsResponse, LimitQuery, PlayerStatsResponse, RankingResponse, RecentGamesResponse,
    SetVisibilityRequest, VisibilityResponse,
};
use crate::service;

#[derive(Clone)]
pub struct LeaderboardState {
    pub db: duel_db::PersistenceContext,
}

const ALLOWED_CALLERS: &[ServiceName] = &[ServiceName::Gateway];

pub fn router(state: LeaderboardState, credentials: Arc<ServiceCredentials>, user_auth: UserAuthState) -> Router {
    let service_guard = from_fn_with_state(TrustGuard::new(credentials, ALLOWED_CALLERS), require_service_key);
    let user_guard = from_fn_with_state(user_auth, require_user_auth);

    Router::new()
        .route("/internal/leaderboard/global", get(global_handler))
        .route("/internal/leaderboard/player/:username", get(player_stats_handler))
        .route("/internal/leaderboard/recent", get(recent_handler))
        .route("/internal/leaderboard/stats", get(aggregate_handler))
        .route(
            "/internal/leaderboard/visibility",
            get(get_visibility_handler).put(set_visibility_handler),
        )
        .layer(user_guard)
        .layer(service_guard)
        .with_state(state)
}

async fn global_handler(State(state): State<LeaderboardState>, Query(q): Query<LimitQuery>) -> Response {
    match service::global_ranking(&state.db, q.limit).await {
        Ok(entries) => Json(RankingResponse { entries }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn player_stats_handler(
    State(state): State<LeaderboardState>,
    Path(username): Path<String>,
    Query(q): Query<LimitQuery>,
) -> Response {
    match service::player_stats(&state.db, &username, q.limit).await {
        Ok(stats) => Json(PlayerStatsResponse { stats }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn recent_handler(State(state): State<LeaderboardState>, Query(q): Query<LimitQuery>) -> Response {
    match service::recent_games(&state.db, q.limit).await {
        Ok(games) => Json(RecentGamesResponse { games }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn aggregate_handler(State(state): State<LeaderboardState>) -> Response {
    match service::aggregate_stats(&state.db).await {
        Ok(stats) => Json(AggregateStatsResponse { stats }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn get_visibility_handler(State(state): State<LeaderboardState>, Extension(caller): Extension<Account>) -> Response {
    match service::get_visibility(&state.db, &caller.username).await {
        Ok(visible) => Json(VisibilityResponse { visible }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn set_visibility_handler(
    State(state): State<LeaderboardState>,
    Extension(caller): Extension<Account>,
    Json(req): Json<SetVisibilityRequest>,
) -> Response {
    match service::set_visibility(&state.db, &caller.username, req.visible).await {
        Ok(()) => Json(VisibilityResponse { visible: req.visible }).into_response(),
        Err(e) => error_response(&e),
    }
}
