//! duel-game-service — the game coordinator: the hardest state machine in
//! the system, but the simplest binary, since all the transactional
//! discipline lives in `duel-game` and `duel-db`.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use duel_core::config::{DatabaseConfig, GameHistoryConfig, IdentityConfig};
use duel_core::types::ServiceName;
use duel_crypto::{HistoryCipher, TokenSigner};
use duel_game::{router, GameState};
use duel_trust::{ServiceCredentials, UserAuthState};

#[derive(Parser, Debug)]
#[command(name = "duel-game-service", about = "Game coordinator service")]
struct Args {
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    duel_node::telemetry::init_tracing(args.json_logs);
    info!("game service starting");

    let db_config = DatabaseConfig::from_env()?;
    let db = duel_db::PersistenceContext::connect(&db_config).await?;

    let identity_config = IdentityConfig::from_env()?;
    let signer = Arc::new(TokenSigner::new(&identity_config.jwt_secret_key));
    let user_auth = UserAuthState { signer, db: db.clone() };
    let credentials = Arc::new(ServiceCredentials::load_all()?);

    let history_config = GameHistoryConfig::from_env()?;
    let cipher = Arc::new(HistoryCipher::from_base64(&history_config.history_key_b64)?);

    let cards_base = duel_core::config::service_url(ServiceName::Cards.as_str(), "http://127.0.0.1:8082");
    let cards = duel_cards::CardsClient::new(cards_base)?;

    let audit_base = duel_core::config::service_url(ServiceName::Audit.as_str(), "http://127.0.0.1:8085");
    let audit = duel_audit::AuditClient::new(audit_base, ServiceName::Game)?;

    let state = GameState { db, cipher, cards, audit };
    let app = router(state, credentials, user_auth);

    let addr = duel_core::config::listen_addr(ServiceName::Game.as_str(), "0.0.0.0:8083");
    info!(%addr, "game service ready");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
