//! Environment-driven configuration, read once at process start into an
//! explicit struct rather than consulted ad hoc from handlers — replaces the
//! source's module-level globals with a context object every service
//! constructs in `main` and threads through its handlers.

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_LOCKOUT_DURATION_SECS, DEFAULT_LOCKOUT_THRESHOLD,
    DEFAULT_REFRESH_TOKEN_TTL_SECS,
};
use crate::error::{DuelError, DuelResult};

fn read_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn require_var(key: &str) -> DuelResult<String> {
    read_var(key).ok_or_else(|| {
        DuelError::internal(format!("missing mandatory configuration: {key}"))
    })
}

fn read_u64_secs(key: &str, default_secs: i64) -> i64 {
    read_var(key)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default_secs)
}

/// Database connection configuration shared by every service that talks to
/// `duel-db` (today, only `duel-node`'s persistence-service binary opens the
/// pool directly; other services go through its RPC surface).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> DuelResult<Self> {
        Ok(Self {
            url: require_var("DATABASE_URL")?,
            max_connections: read_var("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }
}

/// Token signing / session policy, consumed by `duel-identity`.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub jwt_secret_key: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub lockout_threshold: u32,
    pub lockout_duration: Duration,
}

impl IdentityConfig {
    pub fn from_env() -> DuelResult<Self> {
        Ok(Self {
            jwt_secret_key: require_var("JWT_SECRET_KEY")?,
            access_token_ttl: Duration::from_secs(
                read_u64_secs("ACCESS_TOKEN_TTL", DEFAULT_ACCESS_TOKEN_TTL_SECS).max(1) as u64,
            ),
            refresh_token_ttl: Duration::from_secs(
                read_u64_secs("REFRESH_TOKEN_TTL", DEFAULT_REFRESH_TOKEN_TTL_SECS).max(1) as u64,
            ),
            lockout_threshold: read_var("LOCKOUT_THRESHOLD")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LOCKOUT_THRESHOLD),
            lockout_duration: Duration::from_secs(
                read_u64_secs("LOCKOUT_DURATION", DEFAULT_LOCKOUT_DURATION_SECS).max(1) as u64,
            ),
        })
    }
}

/// History-archive encryption configuration, consumed by `duel-game`.
#[derive(Debug, Clone)]
pub struct GameHistoryConfig {
    /// URL-safe base64 of exactly 32 raw bytes.
    pub history_key_b64: String,
}

impl GameHistoryConfig {
    pub fn from_env() -> DuelResult<Self> {
        let history_key_b64 = require_var("GAME_HISTORY_KEY")?;
        Ok(Self { history_key_b64 })
    }
}

/// Optional mutual-TLS material for service-to-service connections. Present
/// only when `CERT_DIR` is set; the header-based service credential is
/// always enforced regardless of whether this is configured.
#[derive(Debug, Clone)]
pub struct MtlsConfig {
    pub cert_dir: String,
    pub cert_path: String,
    pub key_path: String,
    pub ca_path: String,
}

impl MtlsConfig {
    /// Returns `None` when `CERT_DIR` is unset — mTLS is opt-in.
    pub fn from_env(service_prefix: &str) -> DuelResult<Option<Self>> {
        let Some(cert_dir) = read_var("CERT_DIR") else {
            return Ok(None);
        };
        let upper = service_prefix.to_ascii_uppercase();
        let cert_path = read_var(&format!("{upper}_CERT_PATH"))
            .unwrap_or_else(|| format!("{cert_dir}/{service_prefix}.crt"));
        let key_path = read_var(&format!("{upper}_KEY_PATH"))
            .unwrap_or_else(|| format!("{cert_dir}/{service_prefix}.key"));
        let ca_path =
            read_var("CA_CERT_PATH").unwrap_or_else(|| format!("{cert_dir}/ca.crt"));
        Ok(Some(Self {
            cert_dir,
            cert_path,
            key_path,
            ca_path,
        }))
    }
}

/// Loads every `{SERVICE}_SERVICE_API_KEY` variable present in the
/// environment for the given service names, failing if any is missing.
/// Consumed by `duel-trust::ServiceCredentials::from_env`.
pub fn service_api_key(name: &str) -> DuelResult<String> {
    require_var(&format!("{}_SERVICE_API_KEY", name.to_ascii_uppercase()))
}

/// Listen address for a service binary, defaulting per-service but
/// overridable via `{SERVICE}_LISTEN_ADDR`.
pub fn listen_addr(service_name: &str, default_addr: &str) -> String {
    read_var(&format!("{}_LISTEN_ADDR", service_name.to_ascii_uppercase()))
        .unwrap_or_else(|| default_addr.to_string())
}

/// Base URL the gateway (or any other cross-service caller) dials to reach
/// a peer, overridable via `{SERVICE}_SERVICE_URL` and falling back to a
/// loopback default derived from that service's own listen port — so a
/// single-host deployment works with no configuration at all.
pub fn service_url(service_name: &str, default_url: &str) -> String {
    read_var(&format!("{}_SERVICE_URL", service_name.to_ascii_uppercase()))
        .unwrap_or_else(|| default_url.to_string())
}
