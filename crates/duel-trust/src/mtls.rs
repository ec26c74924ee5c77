//! Optional mutual-TLS layer for service-to-service connections. Only
//! activated when `CERT_DIR` is set; the header-based service credential in
//! `middleware` is enforced regardless of whether this is configured, per
//! spec.md §4.8.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use duel_core::config::MtlsConfig;
use duel_core::error::{DuelError, DuelResult};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};

/// Builds a `rustls::ServerConfig` that requires and verifies a client
/// certificate against the local CA, with hostname verification disabled —
/// identities on the private network are established by certificate
/// subject, not DNS, matching `original_source`'s `mtls_auth.py`.
pub fn build_server_config(config: &MtlsConfig) -> DuelResult<Arc<ServerConfig>> {
    let certs = load_certs(&config.cert_path)?;
    let key = load_key(&config.key_path)?;
    let ca_certs = load_certs(&config.ca_path)?;

    let mut roots = RootCertStore::empty();
    for cert in ca_certs {
        roots
            .add(cert)
            .map_err(|e| DuelError::internal(format!("invalid CA certificate: {e}")))?;
    }

    let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
        .build()
        .map_err(|e| DuelError::internal(format!("building client verifier: {e}")))?;

    let server_config = ServerConfig::builder()
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)
        .map_err(|e| DuelError::internal(format!("invalid server certificate/key: {e}")))?;

    Ok(Arc::new(server_config))
}

fn load_certs(path: &str) -> DuelResult<Vec<rustls::pki_types::CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|e| DuelError::internal(format!("reading certificate {path}: {e}")))?;
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
