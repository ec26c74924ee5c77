//! Per-account leaderboard visibility toggle. Absence of a row means
//! visible — the row is created lazily the first time a player flips it,
//! per the Open Question 4 resolution recorded in `DESIGN.md`.

use duel_core::error::DuelResult;

use crate::db_err;
use crate::PersistenceContext;

pub async fn get(ctx: &PersistenceContext, username: &str) -> DuelResult<bool> {
    let row: Option<(bool,)> =
        sqlx::query_as("SELECT visible FROM user_preferences WHERE username = $1")
            .bind(username)
            .fetch_optional(ctx.pool())
            .await
            .map_err(db_err)?;
    Ok(row.map(|(v,)| v).unwrap_or(true))
}

pub async fn set(ctx: &PersistenceContext, username: &str, visible: bool) -> DuelResult<()> {
    sqlx::query(
        r#"
        INSERT INTO user_preferences (username, visible)
        VALUES ($1, $2)
        ON CONFLICT (username) DO UPDATE SET visible = EXCLUDED.visible
        "#,
    )
    .bind(username)
    .bind(visible)
    .execute(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(())
}
