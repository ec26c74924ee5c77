//! Access tokens: a hand-rolled HMAC-SHA256-signed compact token, in the same
//! spirit as a JWT but without pulling in a JWT crate — kept consistent with
//! this codebase's preference for owning its own small crypto primitives.
//!
//! Wire form: `base64url(header).base64url(payload).base64url(signature)`
//! where `header` and `payload` are canonical JSON and `signature` is
//! `HMAC-SHA256(secret, header "." payload)`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use duel_core::constants::REFRESH_TOKEN_BYTES;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature verification failed")]
    BadSignature,
    #[error("token has expired")]
    Expired,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: &'static str,
    typ: &'static str,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: "HS256",
            typ: "DUEL",
        }
    }
}

/// Claims carried by an access token: subject username, issued-at and
/// expiry, both as Unix seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.exp
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}

/// Holds the symmetric signing key for the lifetime of an identity-service
/// process. Immutable after construction, matching the trust model's
/// "config loader only" discipline for key material.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret_key: impl AsRef<str>) -> Self {
        Self {
            secret: secret_key.as_ref().as_bytes().to_vec(),
        }
    }

    /// Sign a fresh access token for `subject`, valid for `ttl_secs` seconds.
    pub fn issue(&self, subject: &str, ttl_secs: i64) -> String {
        let iat = now_unix();
        let claims = AccessClaims {
            sub: subject.to_string(),
            iat,
            exp: iat + ttl_secs,
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &AccessClaims) -> String {
        let header = TokenHeader::default();
        let header_b64 =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).expect("header is always valid json"));
        let payload_b64 =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims are always valid json"));
        let signing_input = format!("{header_b64}.{payload_b64}");
        let signature = self.sign(signing_input.as_bytes());
        let sig_b64 = URL_SAFE_NO_PAD.encode(signature);
        format!("{signing_input}.{sig_b64}")
    }

    fn sign(&self, data: &[u8]) -> [u8; 32] {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts a key of any length");
        mac.update(data);
        mac.finalize().into_bytes().into()
    }

    /// Verify a token's signature and expiry, returning its claims on success.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let signing_input = format!("{header_b64}.{payload_b64}");
        let expected = self.sign(signing_input.as_bytes());
        let given = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| TokenError::Malformed)?;
        if given.len() != expected.len() || !crate::service_auth::constant_time_eq(&given, &expected) {
            return Err(TokenError::BadSignature);
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed)?;
        let claims: AccessClaims =
            serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)?;

        if claims.is_expired(now_unix()) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

/// Generates an opaque, URL-safe, 256-bit refresh token. Server-side object;
/// the client only ever sees the encoded string.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_valid_token() {
        let signer = TokenSigner::new("test-secret");
        let token = signer.issue("alice", 3600);
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[test]
    fn rejects_tampered_signature() {
        let signer = TokenSigner::new("test-secret");
        let mut token = signer.issue("alice", 3600);
        token.push('x');
        assert!(matches!(signer.verify(&token), Err(TokenError::BadSignature)));
    }

    #[test]
    fn rejects_token_signed_with_different_secret() {
        let signer_a = TokenSigner::new("secret-a");
        let signer_b = TokenSigner::new("secret-b");
        let token = signer_a.issue("alice", 3600);
        assert!(matches!(signer_b.verify(&token), Err(TokenError::BadSignature)));
    }

    #[test]
    fn rejects_expired_token() {
        let signer = TokenSigner::new("test-secret");
        let token = signer.issue("alice", -1);
        assert!(matches!(signer.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn refresh_tokens_are_unique() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_ne!(a, b);
    }
}
