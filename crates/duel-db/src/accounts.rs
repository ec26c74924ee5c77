use chrono::{DateTime, Utc};
use duel_core::error::{DuelError, DuelResult};
use duel_core::types::{Account, LoginAttempt};
use sqlx::FromRow;
use uuid::Uuid;

use crate::db_err;
use crate::PersistenceContext;

#[derive(FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    password_hash: String,
    is_admin: bool,
    enabled: bool,
    failed_login_attempts: i32,
    lock_until: Option<DateTime<Utc>>,
    last_failed_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(r: AccountRow) -> Self {
        Account {
            id: r.id,
            username: r.username,
            password_hash: r.password_hash,
            is_admin: r.is_admin,
            enabled: r.enabled,
            failed_login_attempts: r.failed_login_attempts.max(0) as u32,
            lock_until: r.lock_until,
            last_failed_login: r.last_failed_login,
            created_at: r.created_at,
        }
    }
}

/// `CREATE(username, password_hash) -> Account`. Fails `conflict` if the
/// username already exists (enforced by the `users.username` unique index).
pub async fn create(ctx: &PersistenceContext, username: &str, password_hash: &str) -> DuelResult<Account> {
    let row: AccountRow = sqlx::query_as(
        r#"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        RETURNING id, username, password_hash, is_admin, enabled,
                  failed_login_attempts, lock_until, last_failed_login, created_at
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(row.into())
}

pub async fn fetch_by_username(ctx: &PersistenceContext, username: &str) -> DuelResult<Option<Account>> {
    let row: Option<AccountRow> = sqlx::query_as(
        r#"
        SELECT id, username, password_hash, is_admin, enabled,
               failed_login_attempts, lock_until, last_failed_login, created_at
        FROM users WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(row.map(Into::into))
}

pub async fn fetch_by_id(ctx: &PersistenceContext, id: Uuid) -> DuelResult<Option<Account>> {
    let row: Option<AccountRow> = sqlx::query_as(
        r#"
        SELECT id, username, password_hash, is_admin, enabled,
               failed_login_attempts, lock_until, last_failed_login, created_at
        FROM users WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(row.map(Into::into))
}

pub async fn exists(ctx: &PersistenceContext, username: &str) -> DuelResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(username)
        .fetch_one(ctx.pool())
        .await
        .map_err(db_err)?;
    Ok(count > 0)
}

/// Row-level lock info fetched with `FOR UPDATE`, used by login to serialize
/// the read-check-increment sequence against concurrent login attempts for
/// the same account. Call only inside a transaction.
pub async fn lock_info_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    username: &str,
) -> DuelResult<Account> {
    let row: AccountRow = sqlx::query_as(
        r#"
        SELECT id, username, password_hash, is_admin, enabled,
               failed_login_attempts, lock_until, last_failed_login, created_at
        FROM users WHERE username = $1
        FOR UPDATE
        "#,
    )
    .bind(username)
    .fetch_optional(&mut **tx)
    .await
    .map_err(db_err)?
    .ok_or_else(|| DuelError::not_found(format!("no such account: {username}")))?;
    Ok(row.into())
}

/// Last-writer-wins increment: no optimistic retry loop, per the spec's
/// concurrency model — brief overshoot past the lockout threshold is
/// tolerated.
pub async fn record_failed_attempt(ctx: &PersistenceContext, username: &str, now: DateTime<Utc>) -> DuelResult<u32> {
    let attempts: i32 = sqlx::query_scalar(
        r#"
        UPDATE users
        SET failed_login_attempts = failed_login_attempts + 1,
            last_failed_login = $2
        WHERE username = $1
        RETURNING failed_login_attempts
        "#,
    )
    .bind(username)
    .bind(now)
    .fetch_one(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(attempts.max(0) as u32)
}

pub async fn lock_until(ctx: &PersistenceContext, username: &str, until: DateTime<Utc>) -> DuelResult<()> {
    sqlx::query("UPDATE users SET lock_until = $2 WHERE username = $1")
        .bind(username)
        .bind(until)
        .execute(ctx.pool())
        .await
        .map_err(db_err)?;
    Ok(())
}

pub async fn reset_failure_state(ctx: &PersistenceContext, username: &str) -> DuelResult<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET failed_login_attempts = 0, lock_until = NULL, last_failed_login = NULL
        WHERE username = $1
        "#,
    )
    .bind(username)
    .execute(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(())
}

pub async fn update_password(ctx: &PersistenceContext, username: &str, new_hash: &str) -> DuelResult<()> {
    let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE username = $1")
        .bind(username)
        .bind(new_hash)
        .execute(ctx.pool())
        .await
        .map_err(db_err)?;
    if result.rows_affected() == 0 {
        return Err(DuelError::not_found(format!("no such account: {username}")));
    }
    Ok(())
}

/// The full transactional login protocol of spec.md §4.1 steps 1-3: locks
/// the row, checks the lockout window, verifies the password, and applies
/// exactly one of (reset on success / increment+maybe-lock on failure) —
/// all inside one transaction so a concurrent login attempt for the same
/// account serializes on the row lock rather than racing on the counter.
pub async fn try_login(
    ctx: &PersistenceContext,
    username: &str,
    password: &str,
    lockout_threshold: u32,
    lockout_duration: chrono::Duration,
) -> DuelResult<LoginAttempt> {
    let mut tx = ctx.pool().begin().await.map_err(db_err)?;

    let Some(account) = (sqlx::query_as::<_, AccountRow>(
        r#"
        SELECT id, username, password_hash, is_admin, enabled,
               failed_login_attempts, lock_until, last_failed_login, created_at
        FROM users WHERE username = $1
        FOR UPDATE
        "#,
    )
    .bind(username)
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_err)?
    .map(Account::from)) else {
        // Unknown user: burn the same code path as a bad password so the
        // caller can't distinguish "no such user" from "wrong password".
        return Ok(LoginAttempt::InvalidCredentials { remaining_attempts: lockout_threshold.saturating_sub(1) });
    };

    let now = Utc::now();
    if account.is_locked(now) {
        let until = account.lock_until.expect("is_locked implies lock_until is set");
        tx.commit().await.map_err(db_err)?;
        return Ok(LoginAttempt::Locked {
            retry_after_secs: (until - now).num_seconds().max(0),
            locked_until: until,
        });
    }

    if !account.enabled {
        tx.commit().await.map_err(db_err)?;
        return Ok(LoginAttempt::AccountDisabled);
    }

    let password_ok = duel_crypto::verify_password(password, &account.password_hash)?;
    if password_ok {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, lock_until = NULL, last_failed_login = NULL WHERE username = $1",
        )
        .bind(username)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        return Ok(LoginAttempt::Success(account));
    }

    let attempts: i32 = sqlx::query_scalar(
        r#"
        UPDATE users
        SET failed_login_attempts = failed_login_attempts + 1, last_failed_login = $2
        WHERE username = $1
        RETURNING failed_login_attempts
        "#,
    )
    .bind(username)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(db_err)?;
    let attempts = attempts.max(0) as u32;

    let outcome = if attempts >= lockout_threshold {
        let until = now + lockout_duration;
        sqlx::query("UPDATE users SET lock_until = $2 WHERE username = $1")
            .bind(username)
            .bind(until)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        LoginAttempt::Locked {
            retry_after_secs: lockout_duration.num_seconds(),
            locked_until: until,
        }
    } else {
        LoginAttempt::InvalidCredentials {
            remaining_attempts: lockout_threshold - attempts,
        }
    };

    tx.commit().await.map_err(db_err)?;
    Ok(outcome)
}

/// Ops-only; never exposed over the public HTTP surface.
pub async fn set_admin(ctx: &PersistenceContext, username: &str, is_admin: bool) -> DuelResult<()> {
    sqlx::query("UPDATE users SET is_admin = $2 WHERE username = $1")
        .bind(username)
        .bind(is_admin)
        .execute(ctx.pool())
        .await
        .map_err(db_err)?;
    Ok(())
}
