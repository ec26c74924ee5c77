//! Client-facing HTTP surface. Every route here does exactly one thing:
//! authenticate nothing itself (the owning internal service does that),
//! reshape the handful of fields that differ from the internal contract,
//! and forward. The gateway holds no database handle.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use reqwest::Method;

use crate::config::UpstreamConfig;
use crate::dto::{
    CreateGameClientRequest, CreateGameInternalRequest, DeckCardType, HealthResponse, LimitQuery,
    LogoutClientRequest, LogoutInternalRequest, RandomDeckClientRequest, RefreshClientRequest,
    RefreshInternalRequest, SelectDeckClientRequest, SelectDeckInternalRequest,
    UpdateProfileClientRequest, UpdatePasswordInternalRequest,
};
use crate::middleware::require_json_content_type;
use crate::proxy::Proxy;

#[derive(Clone)]
pub struct GatewayState {
    pub proxy: Proxy,
    pub upstreams: Arc<UpstreamConfig>,
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(healthz))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/profile", get(get_profile).put(update_profile))
        .route("/api/auth/validate", post(validate))
        .route("/api/cards", get(list_cards))
        .route("/api/cards/by-type/:suit", get(cards_by_type))
        .route("/api/cards/:id", get(card_by_id))
        .route("/api/cards/random-deck", post(random_deck))
        .route("/api/games", post(create_game))
        .route("/api/games/:id", get(get_game))
        .route("/api/games/:id/accept", post(accept_game))
        .route("/api/games/:id/ignore", post(ignore_game))
        .route("/api/games/:id/cancel", post(cancel_game))
        .route("/api/games/:id/select-deck", post(select_deck))
        .route("/api/games/:id/draw-hand", post(draw_hand))
        .route("/api/games/:id/play-card", post(play_card))
        .route("/api/games/:id/resolve-round", post(resolve_round))
        .route("/api/games/:id/tiebreaker-decision", post(tiebreaker_decision))
        .route("/api/games/:id/tiebreaker-play", post(tiebreaker_play))
        .route("/api/games/:id/end", post(end_game))
        .route("/api/games/:id/history", get(game_history))
        .route("/api/leaderboard", get(leaderboard_global))
        .route("/api/leaderboard/player/:name", get(leaderboard_player))
        .route("/api/logs/list", get(logs_list))
        .layer(from_fn(require_json_content_type))
        .with_state(state)
}

async fn healthz() -> Response {
    axum::Json(HealthResponse { status: "ok" }).into_response()
}

fn bearer(headers: &axum::http::HeaderMap) -> Option<&str> {
    duel_trust::http::bearer_token(headers)
}

/// Bodies on these two routes are optional per the client contract; an
/// empty or unparsable body is treated as "no fields supplied" rather than
/// a hard error, since `content-type` enforcement already rejected anything
/// malformed that claimed to be JSON.
fn parse_optional_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> Option<T> {
    if body.is_empty() {
        None
    } else {
        serde_json::from_slice(body).ok()
    }
}

// ── Identity ──────────────────────────────────────────────────────────────

async fn register(State(state): State<GatewayState>, Json(body): Json<serde_json::Value>) -> Response {
    let url = format!("{}/internal/auth/register", state.upstreams.identity);
    state.proxy.send(Method::POST, url, None, &[], Some(body)).await
}

async fn login(State(state): State<GatewayState>, Json(body): Json<serde_json::Value>) -> Response {
    let url = format!("{}/internal/auth/login", state.upstreams.identity);
    state.proxy.send(Method::POST, url, None, &[], Some(body)).await
}

async fn refresh(State(state): State<GatewayState>, Json(body): Json<RefreshClientRequest>) -> Response {
    let url = format!("{}/internal/auth/refresh", state.upstreams.identity);
    let internal = RefreshInternalRequest { refresh: body.refresh_token };
    state
        .proxy
        .send(Method::POST, url, None, &[], Some(serde_json::to_value(internal).unwrap()))
        .await
}

async fn logout(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let url = format!("{}/internal/auth/logout", state.upstreams.identity);
    let refresh_token = parse_optional_json::<LogoutClientRequest>(&body).and_then(|b| b.refresh_token);
    let internal = LogoutInternalRequest { refresh: refresh_token };
    state
        .proxy
        .send(Method::POST, url, bearer(&headers), &[], Some(serde_json::to_value(internal).unwrap()))
        .await
}

async fn get_profile(State(state): State<GatewayState>, headers: axum::http::HeaderMap) -> Response {
    let url = format!("{}/internal/auth/profile", state.upstreams.identity);
    state.proxy.send(Method::GET, url, bearer(&headers), &[], None).await
}

async fn update_profile(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Json(body): Json<UpdateProfileClientRequest>,
) -> Response {
    let url = format!("{}/internal/auth/profile/password", state.upstreams.identity);
    let internal = UpdatePasswordInternalRequest { new_password: body.password };
    state
        .proxy
        .send(Method::POST, url, bearer(&headers), &[], Some(serde_json::to_value(internal).unwrap()))
        .await
}

async fn validate(State(state): State<GatewayState>, headers: axum::http::HeaderMap) -> Response {
    let url = format!("{}/internal/auth/validate", state.upstreams.identity);
    state.proxy.send(Method::GET, url, bearer(&headers), &[], None).await
}

// ── Cards ─────────────────────────────────────────────────────────────────

async fn list_cards(State(state): State<GatewayState>, headers: axum::http::HeaderMap) -> Response {
    let url = format!("{}/internal/cards", state.upstreams.cards);
    state.proxy.send(Method::GET, url, bearer(&headers), &[], None).await
}

async fn cards_by_type(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(suit): Path<String>,
) -> Response {
    let url = format!("{}/internal/cards/by-suit/{suit}", state.upstreams.cards);
    state.proxy.send(Method::GET, url, bearer(&headers), &[], None).await
}

async fn card_by_id(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<u32>,
) -> Response {
    let url = format!("{}/internal/cards/{id}", state.upstreams.cards);
    state.proxy.send(Method::GET, url, bearer(&headers), &[], None).await
}

async fn random_deck(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let size = parse_optional_json::<RandomDeckClientRequest>(&body)
        .and_then(|b| b.size)
        .unwrap_or(duel_core::constants::DECK_SIZE);
    let url = format!("{}/internal/cards/random-deck", state.upstreams.cards);
    state
        .proxy
        .send(Method::GET, url, bearer(&headers), &[("size", size.to_string())], None)
        .await
}

// ── Games ─────────────────────────────────────────────────────────────────

async fn create_game(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Json(body): Json<CreateGameClientRequest>,
) -> Response {
    let url = format!("{}/internal/games", state.upstreams.game);
    let internal = CreateGameInternalRequest { invitee: body.player2_name };
    state
        .proxy
        .send(Method::POST, url, bearer(&headers), &[], Some(serde_json::to_value(internal).unwrap()))
        .await
}

async fn get_game(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Response {
    let url = format!("{}/internal/games/{id}", state.upstreams.game);
    state.proxy.send(Method::GET, url, bearer(&headers), &[], None).await
}

async fn accept_game(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Response {
    let url = format!("{}/internal/games/{id}/accept", state.upstreams.game);
    state.proxy.send(Method::POST, url, bearer(&headers), &[], None).await
}

async fn ignore_game(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Response {
    let url = format!("{}/internal/games/{id}/ignore", state.upstreams.game);
    state.proxy.send(Method::POST, url, bearer(&headers), &[], None).await
}

async fn cancel_game(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Response {
    let url = format!("{}/internal/games/{id}/cancel", state.upstreams.game);
    state.proxy.send(Method::POST, url, bearer(&headers), &[], None).await
}

async fn select_deck(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Json(body): Json<SelectDeckClientRequest>,
) -> Response {
    let url = format!("{}/internal/games/{id}/select-deck", state.upstreams.game);
    let composition = body.deck.into_iter().map(|DeckCardType { suit }| suit).collect();
    let internal = SelectDeckInternalRequest { composition };
    state
        .proxy
        .send(Method::POST, url, bearer(&headers), &[], Some(serde_json::to_value(internal).unwrap()))
        .await
}

async fn draw_hand(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Response {
    let url = format!("{}/internal/games/{id}/draw", state.upstreams.game);
    state.proxy.send(Method::POST, url, bearer(&headers), &[], None).await
}

async fn play_card(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let url = format!("{}/internal/games/{id}/play", state.upstreams.game);
    state.proxy.send(Method::POST, url, bearer(&headers), &[], Some(body)).await
}

async fn resolve_round(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Response {
    let url = format!("{}/internal/games/{id}/resolve-round", state.upstreams.game);
    state.proxy.send(Method::GET, url, bearer(&headers), &[], None).await
}

async fn tiebreaker_decision(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let url = format!("{}/internal/games/{id}/tiebreaker-decision", state.upstreams.game);
    state.proxy.send(Method::POST, url, bearer(&headers), &[], Some(body)).await
}

async fn tiebreaker_play(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Response {
    let url = format!("{}/internal/games/{id}/tiebreaker-play", state.upstreams.game);
    state.proxy.send(Method::POST, url, bearer(&headers), &[], None).await
}

async fn end_game(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Response {
    let url = format!("{}/internal/games/{id}/end", state.upstreams.game);
    state.proxy.send(Method::POST, url, bearer(&headers), &[], None).await
}

async fn game_history(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Response {
    let url = format!("{}/internal/games/{id}/history", state.upstreams.game);
    state.proxy.send(Method::GET, url, bearer(&headers), &[], None).await
}

// ── Leaderboard ───────────────────────────────────────────────────────────

async fn leaderboard_global(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Query(q): Query<LimitQuery>,
) -> Response {
    let url = format!("{}/internal/leaderboard/global", state.upstreams.leaderboard);
    let query = q.limit.map(|l| vec![("limit", l.to_string())]).unwrap_or_default();
    state.proxy.send(Method::GET, url, bearer(&headers), &query, None).await
}

async fn leaderboard_player(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Path(name): Path<String>,
) -> Response {
    let url = format!("{}/internal/leaderboard/player/{name}", state.upstreams.leaderboard);
    state.proxy.send(Method::GET, url, bearer(&headers), &[], None).await
}

// ── Audit ─────────────────────────────────────────────────────────────────

async fn logs_list(
    State(state): State<GatewayState>,
    headers: axum::http::HeaderMap,
    Query(q): Query<std::collections::HashMap<String, String>>,
) -> Response {
    let url = format!("{}/internal/logs/list", state.upstreams.audit);
    let query: Vec<(&str, String)> = q.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
    state.proxy.send(Method::GET, url, bearer(&headers), &query, None).await
}
