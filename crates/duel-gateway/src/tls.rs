//! TLS termination for the public client-facing listener. Unlike the
//! service-to-service mTLS in `duel_trust::mtls`, the gateway does not
//! demand a client certificate — browsers and CLI clients authenticate
//! with a bearer token, not a certificate.

use std::fs::File;
use std::io::BufReader;

use duel_core::config::MtlsConfig;
use duel_core::error::{DuelError, DuelResult};
use rustls::ServerConfig;

/// Builds a server-auth-only `rustls::ServerConfig` from the same
/// `{PREFIX}_CERT_PATH` / `{PREFIX}_KEY_PATH` convention `MtlsConfig` uses
/// internally, keyed on the `gateway` prefix. Returns `None` when `CERT_DIR`
/// is unset, in which case the caller falls back to plaintext HTTP — useful
/// for local development and the docker-compose demo, where termination
/// happens at a reverse proxy instead.
pub fn load_gateway_tls() -> DuelResult<Option<ServerConfig>> {
    let Some(config) = MtlsConfig::from_env("gateway")? else {
        return Ok(None);
    };

    let certs = load_certs(&config.cert_path)?;
    let key = load_key(&config.key_path)?;

    let server_config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| DuelError::internal(format!("invalid gateway certificate/key: {e}")))?;

    Ok(Some(server_config))
}

fn load_certs(path: &str) -> DuelResult<Vec<rustls::pki_types::CertificateDer<'static>>> {
    let file = File::open(path).map_err(|e| DuelError::internal(format!("reading certificate {path}: {e}")))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DuelError::internal(format!("parsing certificate {path}: {e}")))
}

fn load_key(path: &str) -> DuelResult<rustls::pki_types::PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|e| DuelError::internal(format!("reading key {path}: {e}")))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| DuelError::internal(format!("parsing key {path}: {e}")))?
        .ok_or_else(|| DuelError::internal(format!("no private key found in {path}")))
}
