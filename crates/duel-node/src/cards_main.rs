//! duel-cards-service — the fixed card catalogue. Computed entirely
//! in-memory; the only reason this process touches the database is to
//! authenticate the end users calling it.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use duel_core::config::{DatabaseConfig, IdentityConfig};
use duel_core::types::ServiceName;
use duel_crypto::TokenSigner;
use duel_trust::{ServiceCredentials, UserAuthState};

#[derive(Parser, Debug)]
#[command(name = "duel-cards-service", about = "Card catalogue service")]
struct Args {
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    duel_node::telemetry::init_tracing(args.json_logs);
    info!("cards service starting");

    let db_config = DatabaseConfig::from_env()?;
    let db = duel_db::PersistenceContext::connect(&db_config).await?;

    let identity_config = IdentityConfig::from_env()?;
    let signer = Arc::new(TokenSigner::new(&identity_config.jwt_secret_key));
    let credentials = Arc::new(ServiceCredentials::load_all()?);
    let user_auth = UserAuthState { signer, db };

    let app = duel_cards::router(credentials, user_auth);

    let addr = duel_core::config::listen_addr(ServiceName::Cards.as_str(), "0.0.0.0:8082");
    info!(%addr, "cards service ready");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
