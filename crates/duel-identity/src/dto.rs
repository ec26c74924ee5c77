use chrono::{DateTime, Utc};
use duel_core::types::{Account, SessionDescriptor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegisterResponse {
    pub account_id: Uuid,
    pub access: String,
    pub refresh: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub device_label: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginResponse {
    Success { access: String, refresh: String },
    ConflictActiveSession { session: SessionDescriptor },
    InvalidCredentials { remaining_attempts: u32 },
    Locked { retry_after_secs: i64, locked_until: DateTime<Utc> },
    AccountDisabled,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ValidateResponse {
    pub subject: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub is_admin: bool,
}

impl From<Account> for ProfileResponse {
    fn from(a: Account) -> Self {
        Self { id: a.id, username: a.username, created_at: a.created_at, is_admin: a.is_admin }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub new_password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RevokeAllResponse {
    pub revoked: u64,
}
