pub mod history;
pub mod password;
pub mod service_auth;
pub mod tokens;

pub use history::{HistoryCipher, HistoryCipherError};
pub use password::{hash_password, validate_password_policy, validate_username_policy, verify_password};
pub use service_auth::constant_time_eq;
pub use tokens::{generate_refresh_token, AccessClaims, TokenError, TokenSigner};
