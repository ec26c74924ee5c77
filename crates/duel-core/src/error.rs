use thiserror::Error;

/// The closed error taxonomy shared by every duel service. Every fallible
/// operation in the system — persistence, identity, game, leaderboard, audit,
/// trust — ultimately resolves into one of these variants so that the gateway
/// can map it to an HTTP status without knowing which service produced it.
#[derive(Debug, Error)]
pub enum DuelError {
    /// Malformed or out-of-range input. Maps to HTTP 400.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// Missing, expired, or unverifiable credentials. Maps to HTTP 401.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but not permitted to perform this operation. Maps to HTTP 403.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The referenced resource does not exist. Maps to HTTP 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with the current state of the resource
    /// (duplicate username, non-pending game cancelled, already archived).
    /// Maps to HTTP 409.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The resource is temporarily locked (account lockout). Maps to HTTP 423.
    #[error("locked: {0}")]
    Locked(String),

    /// A stored record failed its integrity check (MAC mismatch on an
    /// archived game). Maps to HTTP 409, same as `Conflict`, but kept as a
    /// distinct variant so callers and the audit log can tell the two apart.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    /// A downstream dependency (database, peer service) is unreachable or
    /// returned an unexpected error. Maps to HTTP 502/503.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Anything else — a programming error or unclassified failure. Maps to
    /// HTTP 500. Never expose the inner detail verbatim to a client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DuelError {
    /// Stable machine-readable category, independent of the human-readable
    /// reason string. Used by the gateway's JSON error body and by the audit
    /// log when recording `IntegrityViolationDetected`.
    pub fn category(&self) -> &'static str {
        match self {
            DuelError::Invalid(_) => "invalid",
            DuelError::Unauthenticated(_) => "unauthenticated",
            DuelError::Forbidden(_) => "forbidden",
            DuelError::NotFound(_) => "not_found",
            DuelError::Conflict(_) => "conflict",
            DuelError::Locked(_) => "locked",
            DuelError::IntegrityViolation(_) => "integrity_violation",
            DuelError::Unavailable(_) => "unavailable",
            DuelError::Internal(_) => "internal",
        }
    }

    /// The HTTP status code this variant maps to, per the error taxonomy.
    pub fn http_status(&self) -> u16 {
        match self {
            DuelError::Invalid(_) => 400,
            DuelError::Unauthenticated(_) => 401,
            DuelError::Forbidden(_) => 403,
            DuelError::NotFound(_) => 404,
            DuelError::Conflict(_) => 409,
            DuelError::Locked(_) => 423,
            DuelError::IntegrityViolation(_) => 409,
            DuelError::Unavailable(_) => 503,
            DuelError::Internal(_) => 500,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        DuelError::Invalid(reason.into())
    }

    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        DuelError::Unauthenticated(reason.into())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        DuelError::Forbidden(reason.into())
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        DuelError::NotFound(reason.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        DuelError::Conflict(reason.into())
    }

    pub fn locked(reason: impl Into<String>) -> Self {
        DuelError::Locked(reason.into())
    }

    pub fn integrity_violation(reason: impl Into<String>) -> Self {
        DuelError::IntegrityViolation(reason.into())
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        DuelError::Unavailable(reason.into())
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        DuelError::Internal(reason.into())
    }
}

impl From<serde_json::Error> for DuelError {
    fn from(e: serde_json::Error) -> Self {
        DuelError::Internal(format!("serialization error: {e}"))
    }
}

pub type DuelResult<T> = Result<T, DuelError>;
