//! Leaderboard / reporting business logic: every read here is derived
//! entirely from `game_history` (and, for visibility, `user_preferences`).
//! No operation in this crate ever mutates a game row (spec.md §4.5).

use duel_core::constants::{LEADERBOARD_DEFAULT_LIMIT, LEADERBOARD_MAX_LIMIT};
use duel_core::error::DuelResult;
use duel_core::types::{AggregateStats, ArchivedGameSummary, LeaderboardEntry, PlayerStats};
use duel_db::PersistenceContext;

fn clamp_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(LEADERBOARD_DEFAULT_LIMIT as u32)
        .min(LEADERBOARD_MAX_LIMIT as u32)
        .max(1)
}

pub async fn global_ranking(db: &PersistenceContext, limit: Option<u32>) -> DuelResult<Vec<LeaderboardEntry>> {
    duel_db::leaderboard::global_ranking(db, clamp_limit(limit)).await
}

/// A player's own stats always include them, regardless of their
/// visibility setting — visibility only governs the global ranking view.
pub async fn player_stats(db: &PersistenceContext, username: &str, recent_limit: Option<u32>) -> DuelResult<PlayerStats> {
    let (wins, losses, ties) = duel_db::leaderboard::player_record(db, username).await?;
    let recent_games = duel_db::history::for_player(db, username, clamp_limit(recent_limit)).await?;
    let total_games = wins + losses + ties;
    let win_ratio = if total_games == 0 { 0.0 } else { wins as f64 / total_games as f64 };
    Ok(PlayerStats {
        username: username.to_string(),
        wins,
        losses,
        ties,
        total_games,
        win_ratio,
        recent_games,
    })
}

pub async fn recent_games(db: &PersistenceContext, limit: Option<u32>) -> DuelResult<Vec<ArchivedGameSummary>> {
    duel_db::history::recent(db, clamp_limit(limit)).await
}

pub async fn aggregate_stats(db: &PersistenceContext) -> DuelResult<AggregateStats> {
    duel_db::leaderboard::aggregate_stats(db).await
}

pub async fn get_visibility(db: &PersistenceContext, username: &str) -> DuelResult<bool> {
    duel_db::visibility::get(db, username).await
}

pub async fn set_visibility(db: &PersistenceContext, username: &str, visible: bool) -> DuelResult<()> {
    duel_db::visibility::set(db, username, visible).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limit_defaults_caps_and_floors() {
        assert_eq!(clamp_limit(None), LEADERBOARD_DEFAULT_LIMIT as u32);
        assert_eq!(clamp_limit(Some(10_000)), LEADERBOARD_MAX_LIMIT as u32);
        assert_eq!(clamp_limit(Some(0)), 1);
    }
}
