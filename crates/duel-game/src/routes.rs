//! Game coordinator HTTP surface. Reachable from the gateway (on behalf of
//! end users) and the game coordinator's own internal loopback is not
//! needed — the service calls out to cards, not the reverse.

use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use duel_core::error::DuelError;
use duel_core::types::{Account, AuditAction, ServiceName};
use duel_crypto::HistoryCipher;
use duel_trust::http::{bearer_token, error_response};
use duel_trust::{require_service_key, require_user_auth, ServiceCredentials, TrustGuard, UserAuthState};
use uuid::Uuid;

use duel_audit::AuditClient;
use duel_cards::CardsClient;

use crate::dto::{
    CreateGameRequest, GameListResponse, GameResponse, HistoryResponse, PlayCardRequest, SelectDeckRequest,
    TiebreakerDecisionRequest,
};
use crate::service;

#[derive(Clone)]
pub struct GameState {
    pub db: duel_db::PersistenceContext,
    pub cipher: Arc<HistoryCipher>,
    pub cards: CardsClient,
    pub audit: AuditClient,
}

const ALLOWED_CALLERS: &[ServiceName] = &[ServiceName::Gateway];

pub fn router(state: GameState, credentials: Arc<ServiceCredentials>, user_auth: UserAuthState) -> Router {
    let service_guard = from_fn_with_state(TrustGuard::new(credentials, ALLOWED_CALLERS), require_service_key);
    let user_guard = from_fn_with_state(user_auth, require_user_auth);

    Router::new()
        .route("/internal/games", post(create_handler).get(list_handler))
        .route("/internal/games/:id", get(get_handler))
        .route("/internal/games/:id/accept", post(accept_handler))
        .route("/internal/games/:id/ignore", post(ignore_handler))
        .route("/internal/games/:id/cancel", post(cancel_handler))
        .route("/internal/games/:id/select-deck", post(select_deck_handler))
        .route("/internal/games/:id/draw", post(draw_handler))
        .route("/internal/games/:id/play", post(play_handler))
        .route("/internal/games/:id/resolve-round", get(resolve_round_handler))
        .route("/internal/games/:id/tiebreaker-decision", post(tiebreaker_decision_handler))
        .route("/internal/games/:id/tiebreaker-play", post(tiebreaker_play_handler))
        .route("/internal/games/:id/end", post(end_game_handler))
        .route("/internal/games/:id/history", get(history_handler))
        .layer(user_guard)
        .layer(service_guard)
        .with_state(state)
}

async fn create_handler(
    State(state): State<GameState>,
    Extension(caller): Extension<Account>,
    Json(req): Json<CreateGameRequest>,
) -> Response {
    match service::create_game(&state.db, &caller.username, &req.invitee).await {
        Ok(game) => {
            state.audit.log(
                AuditAction::GameInvitationCreated,
                Some(caller.username),
                Some(format!("game={} invitee={}", game.id, req.invitee)),
            );
            Json(GameResponse::from(game)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn list_handler(State(state): State<GameState>, Extension(caller): Extension<Account>) -> Response {
    match service::list_for_participant(&state.db, &caller.username).await {
        Ok(games) => Json(GameListResponse { games }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn get_handler(State(state): State<GameState>, Extension(caller): Extension<Account>, Path(id): Path<Uuid>) -> Response {
    match service::get_game(&state.db, &caller.username, id).await {
        Ok(game) => Json(GameResponse::from(game)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn accept_handler(State(state): State<GameState>, Extension(caller): Extension<Account>, Path(id): Path<Uuid>) -> Response {
    match service::accept(&state.db, &caller.username, id).await {
        Ok(game) => {
            state.audit.log(AuditAction::GameAccepted, Some(caller.username), Some(format!("game={id}")));
            Json(GameResponse::from(game)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn ignore_handler(State(state): State<GameState>, Extension(caller): Extension<Account>, Path(id): Path<Uuid>) -> Response {
    match service::ignore(&state.db, &state.cipher, &caller.username, id).await {
        Ok(game) => {
            state.audit.log(AuditAction::GameIgnored, Some(caller.username), Some(format!("game={id}")));
            Json(GameResponse::from(game)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn cancel_handler(State(state): State<GameState>, Extension(caller): Extension<Account>, Path(id): Path<Uuid>) -> Response {
    match service::cancel(&state.db, &state.cipher, &caller.username, id).await {
        Ok(game) => {
            state.audit.log(AuditAction::GameCancelled, Some(caller.username), Some(format!("game={id}")));
            Json(GameResponse::from(game)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn select_deck_handler(
    State(state): State<GameState>,
    Extension(caller): Extension<Account>,
    Path(id): Path<Uuid>,
    headers: axum::http::HeaderMap,
    Json(req): Json<SelectDeckRequest>,
) -> Response {
    let Some(access_token) = bearer_token(&headers) else {
        return error_response(&DuelError::unauthenticated("missing bearer token"));
    };
    match service::select_deck(&state.db, &state.cards, access_token, &caller.username, id, req.composition).await {
        Ok(game) => Json(GameResponse::from(game)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn draw_handler(State(state): State<GameState>, Extension(caller): Extension<Account>, Path(id): Path<Uuid>) -> Response {
    match service::draw_hand(&state.db, &caller.username, id).await {
        Ok(game) => Json(GameResponse::from(game)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn play_handler(
    State(state): State<GameState>,
    Extension(caller): Extension<Account>,
    Path(id): Path<Uuid>,
    Json(req): Json<PlayCardRequest>,
) -> Response {
    match service::play_card(&state.db, &state.cipher, &caller.username, id, req.card_index).await {
        Ok(game) => {
            if game.status.is_terminal() {
                state.audit.log(AuditAction::GameCompleted, Some(caller.username), Some(format!("game={id}")));
            }
            Json(GameResponse::from(game)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn resolve_round_handler(
    State(state): State<GameState>,
    Extension(caller): Extension<Account>,
    Path(id): Path<Uuid>,
) -> Response {
    match service::resolve_round_status(&state.db, &caller.username, id).await {
        Ok(game) => Json(GameResponse::from(game)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn tiebreaker_decision_handler(
    State(state): State<GameState>,
    Extension(caller): Extension<Account>,
    Path(id): Path<Uuid>,
    Json(req): Json<TiebreakerDecisionRequest>,
) -> Response {
    match service::tiebreaker_decision(&state.db, &state.cipher, &caller.username, id, req.decision).await {
        Ok(game) => {
            if game.status.is_terminal() {
                state.audit.log(AuditAction::GameCompleted, Some(caller.username), Some(format!("game={id}")));
            }
            Json(GameResponse::from(game)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn tiebreaker_play_handler(
    State(state): State<GameState>,
    Extension(caller): Extension<Account>,
    Path(id): Path<Uuid>,
) -> Response {
    match service::tiebreaker_play(&state.db, &state.cipher, &caller.username, id).await {
        Ok(game) => {
            state.audit.log(AuditAction::GameCompleted, Some(caller.username), Some(format!("game={id}")));
            Json(GameResponse::from(game)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn end_game_handler(State(state): State<GameState>, Extension(caller): Extension<Account>, Path(id): Path<Uuid>) -> Response {
    match service::end_game(&state.db, &state.cipher, &caller.username, id).await {
        Ok(game) => {
            state.audit.log(AuditAction::GameAbandoned, Some(caller.username), Some(format!("game={id}")));
            Json(GameResponse::from(game)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn history_handler(State(state): State<GameState>, Extension(caller): Extension<Account>, Path(id): Path<Uuid>) -> Response {
    match service::get_history(&state.db, &state.cipher, &state.audit, &caller.username, id).await {
        Ok(snapshot) => Json(HistoryResponse::from(snapshot)).into_response(),
        Err(e) => error_response(&e),
    }
}
