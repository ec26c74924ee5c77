//! duel-cli
//!
//! Operator/demo client for the duel backend. Talks to the gateway over
//! plain HTTPS/JSON; holds no game logic or database access of its own.
//!
//! Usage:
//!   duel-cli register     --username <u> --password <p>
//!   duel-cli login        --username <u> --password <p>
//!   duel-cli create-game  --opponent <username>
//!   duel-cli accept       --game-id <uuid>
//!   duel-cli select-deck  --game-id <uuid> --composition rock,paper,scissors,...
//!   duel-cli draw         --game-id <uuid>
//!   duel-cli play         --game-id <uuid> --card-index <n>
//!   duel-cli status       --game-id <uuid>
//!   duel-cli leaderboard  [--limit <n>]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

mod rpc_client;
mod session;

use rpc_client::GatewayClient;
use session::{expand_tilde, Session};

#[derive(Parser, Debug)]
#[command(name = "duel-cli", version, about = "Duel backend operator/demo client")]
struct Args {
    /// Gateway base URL.
    #[arg(long, global = true, default_value = "https://127.0.0.1:8443")]
    gateway: String,

    /// Path to the local session file (stores the last issued tokens).
    #[arg(long, global = true, default_value = "~/.duel-cli/session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new account and store the issued session.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Log in and store the issued session.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Invite an opponent to a new game.
    CreateGame {
        #[arg(long)]
        opponent: String,
    },

    /// Accept a pending invitation.
    Accept {
        #[arg(long)]
        game_id: String,
    },

    /// Submit this player's 22-entry deck composition.
    SelectDeck {
        #[arg(long)]
        game_id: String,
        /// Comma-separated suit names, exactly 22 entries (e.g. rock,paper,...).
        #[arg(long, value_delimiter = ',')]
        composition: Vec<String>,
    },

    /// Draw this turn's hand.
    Draw {
        #[arg(long)]
        game_id: String,
    },

    /// Play a card from the current hand by index.
    Play {
        #[arg(long)]
        game_id: String,
        #[arg(long)]
        card_index: usize,
    },

    /// Print the current state of a game.
    Status {
        #[arg(long)]
        game_id: String,
    },

    /// Print the global leaderboard.
    Leaderboard {
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn,duel_cli=info").init();

    let args = Args::parse();
    let session_path = expand_tilde(&args.session_file);
    let mut session = Session::load(&session_path);
    let client = GatewayClient::new(args.gateway.trim_end_matches('/'));

    match args.command {
        Command::Register { username, password } => {
            let (status, body) = client.register(&username, &password).await?;
            print_result(status, &body);
            if status.is_success() {
                store_tokens(&mut session, &username, &body);
                session.save(&session_path)?;
            }
        }

        Command::Login { username, password } => {
            let (status, body) = client.login(&username, &password).await?;
            print_result(status, &body);
            if status.is_success() {
                store_tokens(&mut session, &username, &body);
                session.save(&session_path)?;
            }
        }

        Command::CreateGame { opponent } => {
            let access = require_access(&session)?;
            let (status, body) = client.create_game(access, &opponent).await?;
            print_result(status, &body);
        }

        Command::Accept { game_id } => {
            let access = require_access(&session)?;
            let (status, body) = client.accept(access, &game_id).await?;
            print_result(status, &body);
        }

        Command::SelectDeck { game_id, composition } => {
            let access = require_access(&session)?;
            let (status, body) = client.select_deck(access, &game_id, &composition).await?;
            print_result(status, &body);
        }

        Command::Draw { game_id } => {
            let access = require_access(&session)?;
            let (status, body) = client.draw_hand(access, &game_id).await?;
            print_result(status, &body);
        }

        Command::Play { game_id, card_index } => {
            let access = require_access(&session)?;
            let (status, body) = client.play_card(access, &game_id, card_index).await?;
            print_result(status, &body);
        }

        Command::Status { game_id } => {
            let access = require_access(&session)?;
            let (status, body) = client.get_game(access, &game_id).await?;
            print_result(status, &body);
        }

        Command::Leaderboard { limit } => {
            let access = require_access(&session)?;
            let (status, body) = client.leaderboard(access, limit).await?;
            print_result(status, &body);
        }
    }

    Ok(())
}

fn require_access(session: &Session) -> anyhow::Result<&str> {
    session
        .access
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("no active session — run `login` or `register` first"))
}

fn store_tokens(session: &mut Session, username: &str, body: &serde_json::Value) {
    session.username = Some(username.to_string());
    if let Some(access) = body.get("access").and_then(|v| v.as_str()) {
        session.access = Some(access.to_string());
    }
    if let Some(refresh) = body.get("refresh").and_then(|v| v.as_str()) {
        session.refresh = Some(refresh.to_string());
    }
}

fn print_result(status: reqwest::StatusCode, body: &serde_json::Value) {
    info!(%status, "response");
    println!("{status}");
    println!("{}", serde_json::to_string_pretty(body).unwrap_or_default());
}
