//! Live game rows. The state-machine logic itself (transitions, round
//! resolution, end conditions) lives in `duel-game`; this module only
//! fetches/locks/persists the `Game` aggregate, consolidating the many
//! transition verbs of spec.md §6.2 into a single `fetch_for_update` +
//! `save` pair so every mutation goes through the same row-lock discipline.

use chrono::{DateTime, Utc};
use duel_core::error::{DuelError, DuelResult};
use duel_core::types::{Game, GameStatus, PlayerState, RoundRecord};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::db_err;
use crate::PersistenceContext;

#[derive(FromRow)]
struct GameRow {
    id: Uuid,
    player1: String,
    player2: String,
    status: String,
    turn: i32,
    player1_state: Json<PlayerState>,
    player2_state: Json<PlayerState>,
    history: Json<Vec<RoundRecord>>,
    awaiting_tiebreaker: bool,
    winner: Option<i16>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> DuelResult<GameStatus> {
    Ok(match s {
        "pending" => GameStatus::Pending,
        "deck_selection" => GameStatus::DeckSelection,
        "active" => GameStatus::Active,
        "completed" => GameStatus::Completed,
        "abandoned" => GameStatus::Abandoned,
        "ignored" => GameStatus::Ignored,
        "cancelled" => GameStatus::Cancelled,
        other => return Err(DuelError::internal(format!("unknown game status in storage: {other}"))),
    })
}

impl GameRow {
    fn into_game(self) -> DuelResult<Game> {
        Ok(Game {
            id: self.id,
            player1: self.player1,
            player2: self.player2,
            status: parse_status(&self.status)?,
            turn: self.turn.max(0) as u32,
            player1_state: self.player1_state.0,
            player2_state: self.player2_state.0,
            history: self.history.0,
            awaiting_tiebreaker: self.awaiting_tiebreaker,
            winner: self.winner.map(|w| w as u8),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLS: &str = r#"
    id, player1, player2, status, turn, player1_state, player2_state,
    history, awaiting_tiebreaker, winner, created_at, updated_at
"#;

pub async fn create(ctx: &PersistenceContext, player1: &str, player2: &str) -> DuelResult<Game> {
    let sql = format!(
        r#"
        INSERT INTO games (player1, player2, status, turn, player1_state, player2_state, history)
        VALUES ($1, $2, 'pending', 1, $3, $3, '[]')
        RETURNING {SELECT_COLS}
        "#
    );
    let row: GameRow = sqlx::query_as(&sql)
        .bind(player1)
        .bind(player2)
        .bind(Json(PlayerState::default()))
        .fetch_one(ctx.pool())
        .await
        .map_err(db_err)?;
    row.into_game()
}

pub async fn fetch(ctx: &PersistenceContext, id: Uuid) -> DuelResult<Option<Game>> {
    let sql = format!("SELECT {SELECT_COLS} FROM games WHERE id = $1");
    let row: Option<GameRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(ctx.pool())
        .await
        .map_err(db_err)?;
    row.map(GameRow::into_game).transpose()
}

/// Locks the game row for the duration of the enclosing transaction. Every
/// mutating game operation (draw, play, resolve, decision, terminal
/// transition) must call this before reading or writing state, so that two
/// concurrent requests against the same game serialize on the database's
/// row lock rather than racing in application code.
pub async fn fetch_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> DuelResult<Game> {
    let sql = format!("SELECT {SELECT_COLS} FROM games WHERE id = $1 FOR UPDATE");
    let row: Option<GameRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?;
    row.ok_or_else(|| DuelError::not_found(format!("no such game: {id}")))?
        .into_game()
}

/// Persists the full mutable surface of a game. Called once per transition,
/// inside the same transaction that holds the row lock from
/// `fetch_for_update`.
pub async fn save(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, game: &Game) -> DuelResult<()> {
    sqlx::query(
        r#"
        UPDATE games SET
            status = $2, turn = $3, player1_state = $4, player2_state = $5,
            history = $6, awaiting_tiebreaker = $7, winner = $8, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(game.id)
    .bind(game.status.as_str())
    .bind(game.turn as i32)
    .bind(Json(&game.player1_state))
    .bind(Json(&game.player2_state))
    .bind(Json(&game.history))
    .bind(game.awaiting_tiebreaker)
    .bind(game.winner.map(|w| w as i16))
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

/// Fetches just the status, for cheap authorization/visibility checks that
/// don't need the full aggregate.
pub async fn fetch_status(ctx: &PersistenceContext, id: Uuid) -> DuelResult<Option<GameStatus>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT status FROM games WHERE id = $1")
        .bind(id)
        .fetch_optional(ctx.pool())
        .await
        .map_err(db_err)?;
    row.map(|(s,)| parse_status(&s)).transpose()
}

pub async fn is_archived(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> DuelResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_history WHERE game_id = $1")
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_err)?;
    Ok(count > 0)
}

/// Games the given player participated in, most recently created first.
/// Used by the leaderboard's recent-games view and by CLI status listing.
pub async fn list_for_participant(ctx: &PersistenceContext, username: &str) -> DuelResult<Vec<Game>> {
    let sql = format!(
        "SELECT {SELECT_COLS} FROM games WHERE player1 = $1 OR player2 = $1 ORDER BY created_at DESC"
    );
    let rows: Vec<GameRow> = sqlx::query_as(&sql)
        .bind(username)
        .fetch_all(ctx.pool())
        .await
        .map_err(db_err)?;
    rows.into_iter().map(GameRow::into_game).collect()
}
