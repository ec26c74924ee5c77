//! Service credential registry: the set of `{SERVICE}_SERVICE_API_KEY`
//! values every process loads at startup so it can recognize which peer is
//! calling it. Immutable after construction, per the "config loader only"
//! discipline in spec.md §5's shared-resource table.

use std::collections::HashMap;
use std::env;

use duel_core::error::{DuelError, DuelResult};
use duel_core::types::ServiceName;

const ALL_SERVICES: [ServiceName; 7] = [
    ServiceName::Gateway,
    ServiceName::Identity,
    ServiceName::Cards,
    ServiceName::Persistence,
    ServiceName::Game,
    ServiceName::Leaderboard,
    ServiceName::Audit,
];

#[derive(Clone)]
pub struct ServiceCredentials {
    /// key string -> service identity, for validating an inbound caller.
    by_key: HashMap<String, ServiceName>,
    /// this process's own key, attached to outbound calls it makes.
    keys_by_name: HashMap<ServiceName, String>,
}

impl ServiceCredentials {
    /// Loads every `{SERVICE}_SERVICE_API_KEY` present in the environment.
    /// Every service in the deployment shares the same small set of
    /// environment variables, so any process can validate any peer's key —
    /// this is the "expected set" the spec's §4.8 constant-time compare is
    /// checked against.
    pub fn load_all() -> DuelResult<Self> {
        let mut by_key = HashMap::new();
        let mut keys_by_name = HashMap::new();
        for name in ALL_SERVICES {
            let key = duel_core::config::service_api_key(name.as_str())?;
            by_key.insert(key.clone(), name);
            keys_by_name.insert(name, key);
        }
        Ok(Self { by_key, keys_by_name })
    }

    /// Loads only the keys needed by a process that doesn't act as a full
    /// callee registry (e.g. the CLI, which only ever presents a key, never
    /// validates one). Falls back to an env lookup at call time.
    pub fn own_key(service: ServiceName) -> DuelResult<String> {
        duel_core::config::service_api_key(service.as_str())
    }

    /// Resolves a presented key to the service identity it belongs to,
    /// comparing in constant time against every known key (not short-
    /// circuiting on the first length mismatch across different keys, only
    /// within the byte comparison of each candidate).
    pub fn resolve(&self, presented_key: &str) -> Option<ServiceName> {
        for (key, name) in &self.by_key {
            if duel_crypto::constant_time_eq(key.as_bytes(), presented_key.as_bytes()) {
                return Some(*name);
            }
        }
        None
    }

    pub fn key_for(&self, service: ServiceName) -> Option<&str> {
        self.keys_by_name.get(&service).map(String::as_str)
    }
}

/// Header carrying the caller's service credential on every internal hop.
pub const SERVICE_KEY_HEADER: &str = "x-service-api-key";

pub fn env_present(service: ServiceName) -> bool {
    env::var(service.env_key()).map(|v| !v.is_empty()).unwrap_or(false)
}

pub fn unauthenticated_missing_key() -> DuelError {
    DuelError::unauthenticated("missing service credential")
}
