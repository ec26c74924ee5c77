//! Best-effort audit client used by the other services to emit log entries
//! without ever letting a logging failure abort the caller's own operation
//! (spec.md §4.6).

use duel_core::error::DuelResult;
use duel_core::types::{AuditAction, ServiceName};
use serde::Serialize;

#[derive(Clone)]
pub struct AuditClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Serialize)]
struct CreateLogRequest<'a> {
    action: AuditAction,
    actor: Option<&'a str>,
    details: Option<&'a str>,
}

impl AuditClient {
    pub fn new(base_url: impl Into<String>, caller: ServiceName) -> DuelResult<Self> {
        let service_key = duel_core::config::service_api_key(caller.as_str())?;
        Ok(Self { http: reqwest::Client::new(), base_url: base_url.into(), service_key })
    }

    /// Fires the write on a detached task and swallows any failure, logging
    /// a warning instead. Callers never await a result.
    pub fn log(&self, action: AuditAction, actor: Option<String>, details: Option<String>) {
        let http = self.http.clone();
        let url = format!("{}/internal/logs/create", self.base_url);
        let service_key = self.service_key.clone();
        tokio::spawn(async move {
            let body = CreateLogRequest { action, actor: actor.as_deref(), details: details.as_deref() };
            let result = http
                .post(&url)
                .header(duel_trust::SERVICE_KEY_HEADER, service_key)
                .json(&body)
                .send()
                .await;
            match result {
                Ok(resp) if !resp.status().is_success() => {
                    tracing::warn!(status = %resp.status(), "audit log write rejected");
                }
                Err(err) => tracing::warn!(%err, "audit log write failed"),
                Ok(_) => {}
            }
        });
    }
}
