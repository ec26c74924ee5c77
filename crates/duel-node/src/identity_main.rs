//! duel-identity-service — account creation, login, session, and profile.
//!
//! Startup sequence:
//!   1. Parse args / load env config
//!   2. Connect the database pool and run migrations
//!   3. Load service credentials and build the signer
//!   4. Serve the identity router

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use duel_core::config::{DatabaseConfig, IdentityConfig};
use duel_core::types::ServiceName;
use duel_crypto::TokenSigner;
use duel_identity::{router, IdentityState};
use duel_trust::ServiceCredentials;

#[derive(Parser, Debug)]
#[command(name = "duel-identity-service", about = "Identity & session service")]
struct Args {
    /// Emit structured JSON logs instead of plain text.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    duel_node::telemetry::init_tracing(args.json_logs);
    info!("identity service starting");

    let db_config = DatabaseConfig::from_env()?;
    let db = duel_db::PersistenceContext::connect(&db_config).await?;
    db.migrate().await?;

    let identity_config = Arc::new(IdentityConfig::from_env()?);
    let signer = Arc::new(TokenSigner::new(&identity_config.jwt_secret_key));
    let credentials = Arc::new(ServiceCredentials::load_all()?);
    let audit_base = duel_core::config::service_url(ServiceName::Audit.as_str(), "http://127.0.0.1:8085");
    let audit = duel_audit::AuditClient::new(audit_base, ServiceName::Identity)?;

    let state = IdentityState { db, signer, config: identity_config, audit };
    let app = router(state, credentials);

    let addr = duel_core::config::listen_addr(ServiceName::Identity.as_str(), "0.0.0.0:8081");
    info!(%addr, "identity service ready");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
