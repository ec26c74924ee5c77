use duel_core::types::{AuditAction, LogEntry};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct CreateLogRequest {
    pub action: AuditAction,
    pub actor: Option<String>,
    pub details: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ListLogsQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub action: Option<AuditAction>,
    pub actor: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LogsResponse {
    pub entries: Vec<LogEntry>,
}
