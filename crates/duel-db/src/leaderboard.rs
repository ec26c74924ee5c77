//! Derived read views over `game_history`. No operation here ever writes to
//! a game row — leaderboard data is purely aggregated from the archive.

use duel_core::error::DuelResult;
use duel_core::types::{AggregateStats, LeaderboardEntry, Suit};
use sqlx::FromRow;

use crate::db_err;
use crate::PersistenceContext;

/// Every archived game contributes one win/loss/tie row per participant, so
/// ranking and per-player stats both read from this same "perspectives" CTE
/// rather than duplicating the case-analysis in two places.
const PERSPECTIVES_CTE: &str = r#"
    WITH perspectives AS (
        SELECT player1 AS username,
               (NOT was_tie AND winner = 1)::int AS win,
               (NOT was_tie AND winner = 2)::int AS loss,
               was_tie::int AS tie
        FROM game_history
        UNION ALL
        SELECT player2 AS username,
               (NOT was_tie AND winner = 2)::int AS win,
               (NOT was_tie AND winner = 1)::int AS loss,
               was_tie::int AS tie
        FROM game_history
    )
"#;

#[derive(FromRow)]
struct RankRow {
    username: String,
    wins: i64,
    losses: i64,
    ties: i64,
}

fn win_ratio(wins: i64, losses: i64, ties: i64) -> f64 {
    let total = wins + losses + ties;
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64
    }
}

/// Global ranking by (wins DESC, win_ratio DESC), excluding any account with
/// `user_preferences.visible = FALSE`. Absence of a preferences row means
/// visible (the lazily-created-row convention from §4.5/§9 Open Question 4).
pub async fn global_ranking(ctx: &PersistenceContext, limit: u32) -> DuelResult<Vec<LeaderboardEntry>> {
    let sql = format!(
        r#"
        {PERSPECTIVES_CTE}
        SELECT p.username, SUM(p.win) AS wins, SUM(p.loss) AS losses, SUM(p.tie) AS ties
        FROM perspectives p
        LEFT JOIN user_preferences up ON up.username = p.username
        WHERE COALESCE(up.visible, TRUE) = TRUE
        GROUP BY p.username
        ORDER BY wins DESC, (SUM(p.win)::float8 / NULLIF(SUM(p.win + p.loss + p.tie), 0)) DESC NULLS LAST
        LIMIT $1
        "#
    );
    let rows: Vec<RankRow> = sqlx::query_as(&sql)
        .bind(limit as i64)
        .fetch_all(ctx.pool())
        .await
        .map_err(db_err)?;
    Ok(rows
        .into_iter()
        .map(|r| LeaderboardEntry {
            username: r.username,
            wins: r.wins.max(0) as u32,
            losses: r.losses.max(0) as u32,
            ties: r.ties.max(0) as u32,
            win_ratio: win_ratio(r.wins, r.losses, r.ties),
        })
        .collect())
}

/// Raw win/loss/tie counts for one player, regardless of their own
/// visibility setting — a player's own stats view always includes them.
pub async fn player_record(ctx: &PersistenceContext, username: &str) -> DuelResult<(u32, u32, u32)> {
    let sql = format!(
        r#"
        {PERSPECTIVES_CTE}
        SELECT $1 AS username, COALESCE(SUM(win), 0) AS wins, COALESCE(SUM(loss), 0) AS losses, COALESCE(SUM(tie), 0) AS ties
        FROM perspectives WHERE username = $1
        "#
    );
    let row: RankRow = sqlx::query_as(&sql)
        .bind(username)
        .fetch_one(ctx.pool())
        .await
        .map_err(db_err)?;
    Ok((row.wins.max(0) as u32, row.losses.max(0) as u32, row.ties.max(0) as u32))
}

pub async fn aggregate_stats(ctx: &PersistenceContext) -> DuelResult<AggregateStats> {
    let total_games: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games")
        .fetch_one(ctx.pool())
        .await
        .map_err(db_err)?;
    let total_completed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_history")
        .fetch_one(ctx.pool())
        .await
        .map_err(db_err)?;

    let avg_rounds: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(jsonb_array_length(history)) FROM games WHERE jsonb_array_length(history) > 0",
    )
    .fetch_one(ctx.pool())
    .await
    .map_err(db_err)?;

    let winning_suits: Vec<(String, i16)> = sqlx::query_as(
        r#"
        SELECT g.history, g.winner
        FROM games g
        WHERE g.winner IS NOT NULL
        "#,
    )
    .fetch_all(ctx.pool())
    .await
    .map_err(db_err)
    .map(|rows: Vec<(serde_json::Value, i16)>| {
        rows.into_iter()
            .filter_map(|(history, winner)| {
                let last = history.as_array()?.last()?;
                let card = last.get(format!("player{winner}_card"))?;
                Some((card.get("suit")?.as_str()?.to_string(), winner))
            })
            .collect()
    })?;

    let most_common_winning_suit = most_common_suit(&winning_suits);

    Ok(AggregateStats {
        total_games: total_games.max(0) as u64,
        total_completed: total_completed.max(0) as u64,
        average_rounds_per_game: avg_rounds.unwrap_or(0.0),
        most_common_winning_suit,
    })
}

fn most_common_suit(winning_suits: &[(String, i16)]) -> Option<Suit> {
    let mut rock = 0u32;
    let mut paper = 0u32;
    let mut scissors = 0u32;
    for (suit, _) in winning_suits {
        match Suit::parse(suit) {
            Some(Suit::Rock) => rock += 1,
            Some(Suit::Paper) => paper += 1,
            Some(Suit::Scissors) => scissors += 1,
            None => {}
        }
    }
    if rock == 0 && paper == 0 && scissors == 0 {
        return None;
    }
    if rock >= paper && rock >= scissors {
        Some(Suit::Rock)
    } else if paper >= scissors {
        Some(Suit::Paper)
    } else {
        Some(Suit::Scissors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_ratio_of_no_games_is_zero() {
        assert_eq!(win_ratio(0, 0, 0), 0.0);
    }

    #[test]
    fn most_common_suit_picks_plurality() {
        let data = vec![
            ("rock".to_string(), 1),
            ("rock".to_string(), 2),
            ("paper".to_string(), 1),
        ];
        assert_eq!(most_common_suit(&data), Some(Suit::Rock));
    }

    #[test]
    fn most_common_suit_of_empty_is_none() {
        assert_eq!(most_common_suit(&[]), None);
    }
}
