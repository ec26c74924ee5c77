//! Archival encryption for completed games: an authenticated symmetric
//! cipher over the canonical history snapshot, plus a MAC tag computed over
//! the ciphertext using a key domain-separated from the master key — so a
//! leaked master key used elsewhere for a different purpose cannot be
//! replayed against archived history records.
//!
//! Mirrors the source's Fernet-plus-HMAC-SHA256 construction
//! (`HistorySecurity`), reexpressed with this codebase's AEAD of choice.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use thiserror::Error;

use duel_core::constants::HISTORY_MAC_DOMAIN;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum HistoryCipherError {
    #[error("history key must decode to exactly 32 bytes")]
    BadKeyLength,
    #[error("invalid base64 history key")]
    BadKeyEncoding,
    #[error("ciphertext shorter than nonce")]
    Truncated,
    #[error("AEAD decryption failed")]
    DecryptionFailed,
    #[error("MAC tag does not match computed value")]
    MacMismatch,
}

/// Holds the process-wide 32-byte history key for the lifetime of a
/// game-coordinator process. Immutable after construction.
#[derive(Clone)]
pub struct HistoryCipher {
    master_key: [u8; 32],
}

impl HistoryCipher {
    /// Builds a cipher from `GAME_HISTORY_KEY`: URL-safe base64 of exactly
    /// 32 raw bytes.
    pub fn from_base64(key_b64: &str) -> Result<Self, HistoryCipherError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(key_b64)
            .or_else(|_| base64::engine::general_purpose::STANDARD.decode(key_b64))
            .map_err(|_| HistoryCipherError::BadKeyEncoding)?;
        if bytes.len() != 32 {
            return Err(HistoryCipherError::BadKeyLength);
        }
        let mut master_key = [0u8; 32];
        master_key.copy_from_slice(&bytes);
        Ok(Self { master_key })
    }

    fn mac_key(&self) -> [u8; 32] {
        let mut input = Vec::with_capacity(32 + HISTORY_MAC_DOMAIN.len());
        input.extend_from_slice(&self.master_key);
        input.extend_from_slice(HISTORY_MAC_DOMAIN);
        *blake3::hash(&input).as_bytes()
    }

    /// Encrypts `plaintext` (the canonical serialized `HistorySnapshot`),
    /// returning `(nonce || ciphertext, mac_tag)`. `mac_tag` is computed
    /// over the nonce-prefixed ciphertext, not the plaintext.
    pub fn encrypt(&self, plaintext: &[u8]) -> (Vec<u8>, [u8; 32]) {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.master_key));
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut ciphertext = cipher
            .encrypt(nonce, plaintext)
            .expect("AEAD encryption with a valid 32-byte key is infallible");
        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.append(&mut ciphertext);

        let mac_key = self.mac_key();
        let tag = *blake3::keyed_hash(&mac_key, &sealed).as_bytes();
        (sealed, tag)
    }

    /// Verifies the MAC tag over `sealed` (nonce || ciphertext) first, then
    /// decrypts. Per the archival-immutability contract, callers must never
    /// return the decrypted snapshot on a MAC mismatch.
    pub fn decrypt_and_verify(
        &self,
        sealed: &[u8],
        mac_tag: &[u8; 32],
    ) -> Result<Vec<u8>, HistoryCipherError> {
        let mac_key = self.mac_key();
        let expected_tag = blake3::keyed_hash(&mac_key, sealed);
        if !crate::service_auth::constant_time_eq(expected_tag.as_bytes(), mac_tag) {
            return Err(HistoryCipherError::MacMismatch);
        }

        if sealed.len() < NONCE_LEN {
            return Err(HistoryCipherError::Truncated);
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.master_key));
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| HistoryCipherError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> String {
        URL_SAFE_NO_PAD.encode([7u8; 32])
    }

    #[test]
    fn round_trips_plaintext() {
        let cipher = HistoryCipher::from_base64(&test_key()).unwrap();
        let (sealed, tag) = cipher.encrypt(b"hello archive");
        let recovered = cipher.decrypt_and_verify(&sealed, &tag).unwrap();
        assert_eq!(recovered, b"hello archive");
    }

    #[test]
    fn detects_tampered_ciphertext() {
        let cipher = HistoryCipher::from_base64(&test_key()).unwrap();
        let (mut sealed, tag) = cipher.encrypt(b"hello archive");
        *sealed.last_mut().unwrap() ^= 0xFF;
        assert!(matches!(
            cipher.decrypt_and_verify(&sealed, &tag),
            Err(HistoryCipherError::MacMismatch)
        ));
    }

    #[test]
    fn detects_tampered_tag() {
        let cipher = HistoryCipher::from_base64(&test_key()).unwrap();
        let (sealed, mut tag) = cipher.encrypt(b"hello archive");
        tag[0] ^= 0xFF;
        assert!(matches!(
            cipher.decrypt_and_verify(&sealed, &tag),
            Err(HistoryCipherError::MacMismatch)
        ));
    }

    #[test]
    fn rejects_wrong_key_length() {
        let bad_key = URL_SAFE_NO_PAD.encode([1u8; 16]);
        assert!(matches!(
            HistoryCipher::from_base64(&bad_key),
            Err(HistoryCipherError::BadKeyLength)
        ));
    }
}
