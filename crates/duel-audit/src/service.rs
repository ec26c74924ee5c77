//! Append-only audit log business logic: bounded pagination and best-effort
//! writes (spec.md §4.6 — "a log failure must not abort the enclosing
//! operation").

use duel_core::constants::{LOG_DEFAULT_PAGE_SIZE, LOG_MAX_PAGE_SIZE};
use duel_core::error::DuelResult;
use duel_core::types::{AuditAction, LogEntry};
use duel_db::PersistenceContext;

pub async fn create(
    db: &PersistenceContext,
    action: AuditAction,
    actor: Option<&str>,
    details: Option<&str>,
) -> DuelResult<()> {
    duel_db::logs::create(db, action, actor, details).await
}

fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(LOG_DEFAULT_PAGE_SIZE as u32).min(LOG_MAX_PAGE_SIZE as u32)
}

pub async fn list(db: &PersistenceContext, offset: u32, limit: Option<u32>) -> DuelResult<Vec<LogEntry>> {
    duel_db::logs::list(db, offset, clamp_limit(limit)).await
}

pub async fn search(
    db: &PersistenceContext,
    action: Option<AuditAction>,
    actor: Option<&str>,
    offset: u32,
    limit: Option<u32>,
) -> DuelResult<Vec<LogEntry>> {
    duel_db::logs::search(db, action, actor, offset, clamp_limit(limit)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limit_defaults_and_caps() {
        assert_eq!(clamp_limit(None), LOG_DEFAULT_PAGE_SIZE as u32);
        assert_eq!(clamp_limit(Some(100_000)), LOG_MAX_PAGE_SIZE as u32);
        assert_eq!(clamp_limit(Some(10)), 10);
    }
}
