//! Card catalogue HTTP surface. Every operation requires both a valid
//! end-user access token and a recognized service credential from the
//! calling peer (the gateway, or the game coordinator materializing a
//! deck), per spec.md §4.2.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use duel_core::error::DuelError;
use duel_core::types::{ServiceName, Suit};
use duel_trust::http::error_response;
use duel_trust::{require_service_key, require_user_auth, ServiceCredentials, TrustGuard, UserAuthState};
use serde::Deserialize;

use crate::catalogue;

#[derive(Clone)]
pub struct CardsState;

const ALLOWED_CALLERS: &[ServiceName] = &[ServiceName::Gateway, ServiceName::Game];

pub fn router(credentials: Arc<ServiceCredentials>, user_auth: UserAuthState) -> Router {
    let service_guard = from_fn_with_state(TrustGuard::new(credentials, ALLOWED_CALLERS), require_service_key);
    let user_guard = from_fn_with_state(user_auth, require_user_auth);

    Router::new()
        .route("/internal/cards", get(list_all_handler))
        .route("/internal/cards/stats", get(stats_handler))
        .route("/internal/cards/by-suit/:suit", get(list_by_suit_handler))
        .route("/internal/cards/:id", get(get_by_id_handler))
        .route("/internal/cards/random-deck", get(random_deck_handler))
        .route("/internal/cards/random-card-of-suit/:suit", get(random_card_of_suit_handler))
        .layer(user_guard)
        .layer(service_guard)
        .with_state(CardsState)
}

async fn list_all_handler(State(_): State<CardsState>) -> Response {
    Json(catalogue::generate_catalogue()).into_response()
}

async fn stats_handler(State(_): State<CardsState>) -> Response {
    Json(catalogue::stats()).into_response()
}

async fn list_by_suit_handler(State(_): State<CardsState>, Path(suit): Path<String>) -> Response {
    match Suit::parse(&suit) {
        Some(suit) => Json(catalogue::list_by_suit(suit)).into_response(),
        None => error_response(&DuelError::invalid(format!("unknown suit: {suit}"))),
    }
}

async fn get_by_id_handler(State(_): State<CardsState>, Path(id): Path<u32>) -> Response {
    match catalogue::get_by_id(id) {
        Some(card) => Json(card).into_response(),
        None => error_response(&DuelError::not_found(format!("no card with id {id}"))),
    }
}

#[derive(Deserialize)]
struct RandomDeckQuery {
    size: usize,
}

async fn random_deck_handler(State(_): State<CardsState>, Query(query): Query<RandomDeckQuery>) -> Response {
    match catalogue::random_deck(query.size) {
        Ok(deck) => Json(deck).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn random_card_of_suit_handler(State(_): State<CardsState>, Path(suit): Path<String>) -> Response {
    match Suit::parse(&suit) {
        Some(suit) => Json(catalogue::random_card_of_suit(suit)).into_response(),
        None => error_response(&DuelError::invalid(format!("unknown suit: {suit}"))),
    }
}
