//! Persistence Adapter: the sole owner of the SQL store. Every other service
//! reaches the database only through the typed modules exposed here, never
//! by holding its own connection — peers hold immutable snapshots obtained
//! by calling into this crate's RPC-shaped operations.

pub mod accounts;
pub mod cards;
pub mod context;
pub mod games;
pub mod history;
pub mod leaderboard;
pub mod logs;
pub mod tokens;
pub mod visibility;

pub use context::PersistenceContext;

/// Embedded migrator, used both by service binaries at startup and by
/// `#[sqlx::test(migrator = "duel_db::MIGRATOR")]` in integration tests.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub(crate) fn db_err(e: sqlx::Error) -> duel_core::error::DuelError {
    match e {
        sqlx::Error::RowNotFound => duel_core::error::DuelError::not_found("row not found"),
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            duel_core::error::DuelError::conflict("unique constraint violated")
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            duel_core::error::DuelError::unavailable(format!("database unavailable: {e}"))
        }
        other => duel_core::error::DuelError::internal(format!("database error: {other}")),
    }
}

/// Opens a transaction for a caller outside this crate (the game
/// coordinator's multi-step writes) without exposing `db_err` itself.
pub async fn begin(ctx: &PersistenceContext) -> duel_core::error::DuelResult<sqlx::Transaction<'_, sqlx::Postgres>> {
    ctx.pool().begin().await.map_err(db_err)
}

pub async fn commit(tx: sqlx::Transaction<'_, sqlx::Postgres>) -> duel_core::error::DuelResult<()> {
    tx.commit().await.map_err(db_err)
}

pub async fn rollback(tx: sqlx::Transaction<'_, sqlx::Postgres>) -> duel_core::error::DuelResult<()> {
    tx.rollback().await.map_err(db_err)
}
