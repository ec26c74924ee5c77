//! Append-only audit log storage. Writes are expected to be best-effort from
//! the caller's perspective (see `duel-audit`) — this module itself still
//! reports write errors faithfully; it is the caller's job to swallow them.

use chrono::{DateTime, Utc};
use duel_core::error::DuelResult;
use duel_core::types::{AuditAction, LogEntry};
use sqlx::FromRow;

use crate::db_err;
use crate::PersistenceContext;

#[derive(FromRow)]
struct LogRow {
    id: i64,
    action: String,
    actor: Option<String>,
    details: Option<String>,
    created_at: DateTime<Utc>,
}

fn parse_action(s: &str) -> Option<AuditAction> {
    use AuditAction::*;
    Some(match s {
        "account_created" => AccountCreated,
        "login_succeeded" => LoginSucceeded,
        "login_failed" => LoginFailed,
        "account_locked" => AccountLocked,
        "password_changed" => PasswordChanged,
        "profile_updated" => ProfileUpdated,
        "refresh_token_issued" => RefreshTokenIssued,
        "refresh_token_revoked" => RefreshTokenRevoked,
        "all_sessions_revoked" => AllSessionsRevoked,
        "game_invitation_created" => GameInvitationCreated,
        "game_accepted" => GameAccepted,
        "game_ignored" => GameIgnored,
        "game_cancelled" => GameCancelled,
        "game_started" => GameStarted,
        "game_completed" => GameCompleted,
        "game_abandoned" => GameAbandoned,
        "tiebreaker_decision" => TiebreakerDecision,
        "game_archived" => GameArchived,
        "integrity_violation_detected" => IntegrityViolationDetected,
        "admin_viewed_logs" => AdminViewedLogs,
        _ => return None,
    })
}

impl LogRow {
    fn into_entry(self) -> Option<LogEntry> {
        Some(LogEntry {
            id: self.id,
            action: parse_action(&self.action)?,
            actor: self.actor,
            details: self.details,
            created_at: self.created_at,
        })
    }
}

pub async fn create(
    ctx: &PersistenceContext,
    action: AuditAction,
    actor: Option<&str>,
    details: Option<&str>,
) -> DuelResult<()> {
    sqlx::query("INSERT INTO logs (action, actor, details) VALUES ($1, $2, $3)")
        .bind(action.as_str())
        .bind(actor)
        .bind(details)
        .execute(ctx.pool())
        .await
        .map_err(db_err)?;
    Ok(())
}

pub async fn list(ctx: &PersistenceContext, offset: u32, limit: u32) -> DuelResult<Vec<LogEntry>> {
    let rows: Vec<LogRow> = sqlx::query_as(
        r#"
        SELECT id, action, actor, details, created_at
        FROM logs
        ORDER BY created_at DESC
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(offset as i64)
    .bind(limit as i64)
    .fetch_all(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().filter_map(LogRow::into_entry).collect())
}

pub async fn search(
    ctx: &PersistenceContext,
    action: Option<AuditAction>,
    actor: Option<&str>,
    offset: u32,
    limit: u32,
) -> DuelResult<Vec<LogEntry>> {
    let rows: Vec<LogRow> = sqlx::query_as(
        r#"
        SELECT id, action, actor, details, created_at
        FROM logs
        WHERE ($1::text IS NULL OR action = $1)
          AND ($2::text IS NULL OR actor = $2)
        ORDER BY created_at DESC
        OFFSET $3 LIMIT $4
        "#,
    )
    .bind(action.map(|a| a.as_str()))
    .bind(actor)
    .bind(offset as i64)
    .bind(limit as i64)
    .fetch_all(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().filter_map(LogRow::into_entry).collect())
}
