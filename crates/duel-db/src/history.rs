//! Archived-game storage: the encrypted, MAC-tagged snapshot plus the
//! plaintext summary columns the leaderboard queries directly without
//! decrypting anything.

use chrono::{DateTime, Utc};
use duel_core::error::{DuelError, DuelResult};
use duel_core::types::ArchivedGameSummary;
use sqlx::FromRow;
use uuid::Uuid;

use crate::db_err;
use crate::PersistenceContext;

#[derive(FromRow)]
struct HistoryRow {
    game_id: Uuid,
    player1: String,
    player2: String,
    player1_score: i32,
    player2_score: i32,
    winner: Option<i16>,
    was_tie: bool,
    archived_at: DateTime<Utc>,
}

impl From<HistoryRow> for ArchivedGameSummary {
    fn from(r: HistoryRow) -> Self {
        ArchivedGameSummary {
            game_id: r.game_id,
            player1: r.player1,
            player2: r.player2,
            player1_score: r.player1_score.max(0) as u32,
            player2_score: r.player2_score.max(0) as u32,
            winner: r.winner.map(|w| w as u8),
            was_tie: r.was_tie,
            archived_at: r.archived_at,
        }
    }
}

/// Writes the archive row. Must run in the same transaction as the live
/// row's terminal-status `save` (§4.4.7: live-row transition and archive
/// write form one logical step). Fails `conflict` if an archive row already
/// exists — archiving is a one-time, one-way operation.
#[allow(clippy::too_many_arguments)]
pub async fn archive(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    summary: &ArchivedGameSummary,
    ciphertext: &[u8],
    mac_tag_hex: &str,
) -> DuelResult<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO game_history
            (game_id, player1, player2, player1_score, player2_score, winner, was_tie, ciphertext, mac_tag)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (game_id) DO NOTHING
        "#,
    )
    .bind(summary.game_id)
    .bind(&summary.player1)
    .bind(&summary.player2)
    .bind(summary.player1_score as i32)
    .bind(summary.player2_score as i32)
    .bind(summary.winner.map(|w| w as i16))
    .bind(summary.was_tie)
    .bind(ciphertext)
    .bind(mac_tag_hex)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;

    if result.rows_affected() == 0 {
        return Err(DuelError::conflict("game is already archived"));
    }
    Ok(())
}

/// Returns `(summary, ciphertext, mac_tag_hex)` for MAC verification and
/// decryption by the caller. Never decrypts here — that's `duel-crypto`'s
/// job, gated by the caller checking the MAC first.
pub async fn fetch_sealed(
    ctx: &PersistenceContext,
    game_id: Uuid,
) -> DuelResult<Option<(ArchivedGameSummary, Vec<u8>, String)>> {
    #[derive(FromRow)]
    struct SealedRow {
        game_id: Uuid,
        player1: String,
        player2: String,
        player1_score: i32,
        player2_score: i32,
        winner: Option<i16>,
        was_tie: bool,
        archived_at: DateTime<Utc>,
        ciphertext: Vec<u8>,
        mac_tag: String,
    }

    let row: Option<SealedRow> = sqlx::query_as(
        r#"
        SELECT game_id, player1, player2, player1_score, player2_score, winner, was_tie,
               archived_at, ciphertext, mac_tag
        FROM game_history WHERE game_id = $1
        "#,
    )
    .bind(game_id)
    .fetch_optional(ctx.pool())
    .await
    .map_err(db_err)?;

    Ok(row.map(|r| {
        let summary = ArchivedGameSummary {
            game_id: r.game_id,
            player1: r.player1,
            player2: r.player2,
            player1_score: r.player1_score.max(0) as u32,
            player2_score: r.player2_score.max(0) as u32,
            winner: r.winner.map(|w| w as u8),
            was_tie: r.was_tie,
            archived_at: r.archived_at,
        };
        (summary, r.ciphertext, r.mac_tag)
    }))
}

pub async fn recent(ctx: &PersistenceContext, limit: u32) -> DuelResult<Vec<ArchivedGameSummary>> {
    let rows: Vec<HistoryRow> = sqlx::query_as(
        r#"
        SELECT game_id, player1, player2, player1_score, player2_score, winner, was_tie, archived_at
        FROM game_history
        ORDER BY archived_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit as i64)
    .fetch_all(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn for_player(ctx: &PersistenceContext, username: &str, limit: u32) -> DuelResult<Vec<ArchivedGameSummary>> {
    let rows: Vec<HistoryRow> = sqlx::query_as(
        r#"
        SELECT game_id, player1, player2, player1_score, player2_score, winner, was_tie, archived_at
        FROM game_history
        WHERE player1 = $1 OR player2 = $1
        ORDER BY archived_at DESC
        LIMIT $2
        "#,
    )
    .bind(username)
    .bind(limit as i64)
    .fetch_all(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(Into::into).collect())
}
