//! duel-leaderboard-service — rankings and reporting, derived read-only
//! from archived games.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use duel_core::config::{DatabaseConfig, IdentityConfig};
use duel_core::types::ServiceName;
use duel_crypto::TokenSigner;
use duel_leaderboard::{router, LeaderboardState};
use duel_trust::{ServiceCredentials, UserAuthState};

#[derive(Parser, Debug)]
#[command(name = "duel-leaderboard-service", about = "Leaderboard / reporting service")]
struct Args {
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    duel_node::telemetry::init_tracing(args.json_logs);
    info!("leaderboard service starting");

    let db_config = DatabaseConfig::from_env()?;
    let db = duel_db::PersistenceContext::connect(&db_config).await?;

    let identity_config = IdentityConfig::from_env()?;
    let signer = Arc::new(TokenSigner::new(&identity_config.jwt_secret_key));
    let user_auth = UserAuthState { signer, db: db.clone() };
    let credentials = Arc::new(ServiceCredentials::load_all()?);

    let state = LeaderboardState { db };
    let app = router(state, credentials, user_auth);

    let addr = duel_core::config::listen_addr(ServiceName::Leaderboard.as_str(), "0.0.0.0:8084");
    info!(%addr, "leaderboard service ready");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
