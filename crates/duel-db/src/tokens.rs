use chrono::{DateTime, Utc};
use duel_core::error::{DuelError, DuelResult};
use duel_core::types::{DeviceDescriptor, RefreshCredential, SessionDescriptor};
use sqlx::FromRow;
use uuid::Uuid;

use crate::db_err;
use crate::PersistenceContext;

#[derive(FromRow)]
struct RefreshRow {
    id: Uuid,
    account_id: Uuid,
    token: String,
    device_label: Option<String>,
    user_agent: Option<String>,
    ip: Option<String>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked: bool,
    revoked_at: Option<DateTime<Utc>>,
    last_used_at: Option<DateTime<Utc>>,
}

impl From<RefreshRow> for RefreshCredential {
    fn from(r: RefreshRow) -> Self {
        RefreshCredential {
            id: r.id,
            account_id: r.account_id,
            token: r.token,
            device: DeviceDescriptor {
                device_label: r.device_label,
                user_agent: r.user_agent,
                ip: r.ip,
            },
            issued_at: r.issued_at,
            expires_at: r.expires_at,
            revoked: r.revoked,
            revoked_at: r.revoked_at,
            last_used_at: r.last_used_at,
        }
    }
}

/// Finds the caller's single active (non-revoked) session, if any, for the
/// `conflict_active_session` response. Must be called inside the same
/// transaction as `store_refresh` to avoid a race with a concurrent login.
pub async fn active_session_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: Uuid,
) -> DuelResult<Option<SessionDescriptor>> {
    let row: Option<RefreshRow> = sqlx::query_as(
        r#"
        SELECT id, account_id, token, device_label, user_agent, ip,
               issued_at, expires_at, revoked, revoked_at, last_used_at
        FROM refresh_tokens
        WHERE account_id = $1 AND revoked = FALSE
        FOR UPDATE
        "#,
    )
    .bind(account_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(db_err)?;

    Ok(row.map(|r| SessionDescriptor {
        device_label: r.device_label,
        ip: r.ip,
        issued_at: r.issued_at,
    }))
}

/// Inserts a new refresh credential. Must run after `active_session_for_update`
/// confirmed no active session exists, in the same transaction — the
/// database's partial unique index is the final backstop against a race.
pub async fn store_refresh(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: Uuid,
    token: &str,
    device: &DeviceDescriptor,
    expires_at: DateTime<Utc>,
) -> DuelResult<()> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (account_id, token, device_label, user_agent, ip, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(account_id)
    .bind(token)
    .bind(&device.device_label)
    .bind(&device.user_agent)
    .bind(&device.ip)
    .bind(expires_at)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

/// Stores a fresh refresh credential in its own transaction, with no active
/// session check — used by `Register`, where no prior session can exist.
pub async fn issue_initial_session(
    ctx: &PersistenceContext,
    account_id: Uuid,
    token: &str,
    device: &DeviceDescriptor,
    expires_at: DateTime<Utc>,
) -> DuelResult<()> {
    let mut tx = ctx.pool().begin().await.map_err(db_err)?;
    store_refresh(&mut tx, account_id, token, device, expires_at).await?;
    tx.commit().await.map_err(db_err)?;
    Ok(())
}

/// Atomic single-session login step: inside one transaction, checks for an
/// existing non-revoked session and either returns its descriptor (rolling
/// back, per spec.md §4.1 step 4's "do NOT silently replace") or stores the
/// new refresh credential and commits.
pub async fn issue_session_or_conflict(
    ctx: &PersistenceContext,
    account_id: Uuid,
    token: &str,
    device: &DeviceDescriptor,
    expires_at: DateTime<Utc>,
) -> DuelResult<Option<SessionDescriptor>> {
    let mut tx = ctx.pool().begin().await.map_err(db_err)?;
    if let Some(existing) = active_session_for_update(&mut tx, account_id).await? {
        tx.rollback().await.map_err(db_err)?;
        return Ok(Some(existing));
    }
    store_refresh(&mut tx, account_id, token, device, expires_at).await?;
    tx.commit().await.map_err(db_err)?;
    Ok(None)
}

pub async fn validate_refresh(ctx: &PersistenceContext, token: &str) -> DuelResult<RefreshCredential> {
    let row: Option<RefreshRow> = sqlx::query_as(
        r#"
        SELECT id, account_id, token, device_label, user_agent, ip,
               issued_at, expires_at, revoked, revoked_at, last_used_at
        FROM refresh_tokens WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(ctx.pool())
    .await
    .map_err(db_err)?;
    let credential: RefreshCredential = row
        .ok_or_else(|| DuelError::unauthenticated("unknown refresh token"))?
        .into();
    if !credential.is_valid(Utc::now()) {
        return Err(DuelError::unauthenticated("refresh token expired or revoked"));
    }
    Ok(credential)
}

pub async fn touch_last_used(ctx: &PersistenceContext, token: &str, now: DateTime<Utc>) -> DuelResult<()> {
    sqlx::query("UPDATE refresh_tokens SET last_used_at = $2 WHERE token = $1")
        .bind(token)
        .bind(now)
        .execute(ctx.pool())
        .await
        .map_err(db_err)?;
    Ok(())
}

/// Idempotent: revoking an already-revoked or unknown token is a no-op.
pub async fn revoke(ctx: &PersistenceContext, token: &str, now: DateTime<Utc>) -> DuelResult<()> {
    sqlx::query(
        r#"
        UPDATE refresh_tokens SET revoked = TRUE, revoked_at = $2
        WHERE token = $1 AND revoked = FALSE
        "#,
    )
    .bind(token)
    .bind(now)
    .execute(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(())
}

pub async fn revoke_all_for_account(ctx: &PersistenceContext, account_id: Uuid, now: DateTime<Utc>) -> DuelResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE refresh_tokens SET revoked = TRUE, revoked_at = $2
        WHERE account_id = $1 AND revoked = FALSE
        "#,
    )
    .bind(account_id)
    .bind(now)
    .execute(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(result.rows_affected())
}

pub async fn list_active_for_account(ctx: &PersistenceContext, account_id: Uuid) -> DuelResult<Vec<RefreshCredential>> {
    let rows: Vec<RefreshRow> = sqlx::query_as(
        r#"
        SELECT id, account_id, token, device_label, user_agent, ip,
               issued_at, expires_at, revoked, revoked_at, last_used_at
        FROM refresh_tokens
        WHERE account_id = $1 AND revoked = FALSE
        ORDER BY issued_at DESC
        "#,
    )
    .bind(account_id)
    .fetch_all(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(Into::into).collect())
}
