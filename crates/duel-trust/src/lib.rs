//! Shared trust-plane primitives used by every service: service credential
//! validation (always enforced) and optional certificate-based mutual TLS.

pub mod credentials;
pub mod http;
pub mod middleware;
pub mod mtls;
pub mod user_auth;

pub use credentials::{ServiceCredentials, SERVICE_KEY_HEADER};
pub use middleware::{require_service_key, TrustGuard};
pub use user_auth::{authenticate, require_user_auth, UserAuthState};
