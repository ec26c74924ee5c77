//! Gateway configuration: where each internal service lives, and the
//! credential this process presents on every hop it makes. The gateway
//! never opens a database connection of its own.

use duel_core::config::service_url;
use duel_core::error::DuelResult;
use duel_core::types::ServiceName;

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub identity: String,
    pub cards: String,
    pub game: String,
    pub leaderboard: String,
    pub audit: String,
}

impl UpstreamConfig {
    pub fn from_env() -> Self {
        Self {
            identity: service_url(ServiceName::Identity.as_str(), "http://127.0.0.1:8081"),
            cards: service_url(ServiceName::Cards.as_str(), "http://127.0.0.1:8082"),
            game: service_url(ServiceName::Game.as_str(), "http://127.0.0.1:8083"),
            leaderboard: service_url(ServiceName::Leaderboard.as_str(), "http://127.0.0.1:8084"),
            audit: service_url(ServiceName::Audit.as_str(), "http://127.0.0.1:8085"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub upstreams: UpstreamConfig,
    pub own_service_key: String,
}

impl GatewayConfig {
    pub fn from_env() -> DuelResult<Self> {
        Ok(Self {
            upstreams: UpstreamConfig::from_env(),
            own_service_key: duel_trust::ServiceCredentials::own_key(ServiceName::Gateway)?,
        })
    }
}
