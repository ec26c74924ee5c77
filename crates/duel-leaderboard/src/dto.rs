use duel_core::types::{AggregateStats, ArchivedGameSummary, LeaderboardEntry, PlayerStats};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RankingResponse {
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerStatsResponse {
    #[serde(flatten)]
    pub stats: PlayerStats,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecentGamesResponse {
    pub games: Vec<ArchivedGameSummary>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AggregateStatsResponse {
    #[serde(flatten)]
    pub stats: AggregateStats,
}

#[derive(Clone, Debug, Serialize)]
pub struct VisibilityResponse {
    pub visible: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SetVisibilityRequest {
    pub visible: bool,
}
