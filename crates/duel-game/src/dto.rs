//! Wire shapes for the game coordinator's HTTP surface.

use duel_core::types::{Game, HistorySnapshot, Suit, TiebreakerDecision};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub invitee: String,
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    #[serde(flatten)]
    pub game: Game,
}

impl From<Game> for GameResponse {
    fn from(game: Game) -> Self {
        GameResponse { game }
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectDeckRequest {
    pub composition: Vec<Suit>,
}

#[derive(Debug, Deserialize)]
pub struct PlayCardRequest {
    pub card_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct TiebreakerDecisionRequest {
    pub decision: TiebreakerDecision,
}

#[derive(Debug, Serialize)]
pub struct GameListResponse {
    pub games: Vec<Game>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    #[serde(flatten)]
    pub snapshot: HistorySnapshot,
}

impl From<HistorySnapshot> for HistoryResponse {
    fn from(snapshot: HistorySnapshot) -> Self {
        HistoryResponse { snapshot }
    }
}
