use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unix-epoch-anchored UTC timestamp used throughout the wire and storage layers.
pub type Timestamp = DateTime<Utc>;

// ── Suit / Card ──────────────────────────────────────────────────────────────

/// One of the three card suits. Beats relation: Rock > Scissors > Paper > Rock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    Rock,
    Paper,
    Scissors,
}

impl Suit {
    pub const ALL: [Suit; 3] = [Suit::Rock, Suit::Paper, Suit::Scissors];

    /// True if `self` beats `other` by suit alone (same-suit is never a beat).
    pub fn beats(self, other: Suit) -> bool {
        matches!(
            (self, other),
            (Suit::Rock, Suit::Scissors) | (Suit::Scissors, Suit::Paper) | (Suit::Paper, Suit::Rock)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Suit::Rock => "rock",
            Suit::Paper => "paper",
            Suit::Scissors => "scissors",
        }
    }

    pub fn parse(s: &str) -> Option<Suit> {
        match s.to_ascii_lowercase().as_str() {
            "rock" => Some(Suit::Rock),
            "paper" => Some(Suit::Paper),
            "scissors" => Some(Suit::Scissors),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single catalogue card: one of 39 fixed (suit, power) pairs, power 1..=13.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub power: u8,
}

impl Card {
    pub fn new(suit: Suit, power: u8) -> Self {
        Self { suit, power }
    }

    /// Stable catalogue id: 0..39, ordered suit-major then by power.
    pub fn catalogue_id(self) -> u32 {
        let suit_index = match self.suit {
            Suit::Rock => 0,
            Suit::Paper => 1,
            Suit::Scissors => 2,
        };
        suit_index * 13 + (self.power as u32 - 1)
    }

    /// Round-resolution outcome against `other`: `true` if `self` wins the
    /// round outright. Does not distinguish a tie from a loss — callers use
    /// `RoundOutcome::resolve` for the full three-way result.
    pub fn beats(self, other: Card) -> bool {
        if self.suit.beats(other.suit) {
            return true;
        }
        if other.suit.beats(self.suit) {
            return false;
        }
        // Same suit: higher power wins, except power 1 beats power 13.
        if self.power == 1 && other.power == 13 {
            return true;
        }
        if self.power == 13 && other.power == 1 {
            return false;
        }
        self.power > other.power
    }
}

// ── Deck / Hand ──────────────────────────────────────────────────────────────

/// An ordered, possibly-duplicated sequence of concrete cards held by one
/// player. Populated at deck-selection time and drained by draws thereafter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck(pub Vec<Card>);

impl Deck {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Cards drawn into a player's hand for the current turn. Empty between
/// rounds; 1..=3 cards while a turn is in progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand(pub Vec<Card>);

impl Hand {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Round outcome / record ───────────────────────────────────────────────────

/// Which seat won a round, or neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundWinner {
    Player1,
    Player2,
    Tie,
}

impl RoundWinner {
    pub fn resolve(card1: Card, card2: Card) -> RoundWinner {
        if card1.suit == card2.suit && card1.power == card2.power {
            return RoundWinner::Tie;
        }
        if card1.beats(card2) {
            RoundWinner::Player1
        } else if card2.beats(card1) {
            RoundWinner::Player2
        } else {
            RoundWinner::Tie
        }
    }
}

/// One entry in a game's round history: both played cards, the outcome, and
/// the running scores immediately after this round was scored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_number: u32,
    pub player1_card: Card,
    pub player2_card: Card,
    pub winner: RoundWinner,
    pub round_tied: bool,
    pub player1_score_after: u32,
    pub player2_score_after: u32,
}

// ── Game ─────────────────────────────────────────────────────────────────────

/// Lifecycle state of a `Game`. Terminal states are
/// `Completed | Abandoned | Ignored | Cancelled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Pending,
    DeckSelection,
    Active,
    Completed,
    Abandoned,
    Ignored,
    Cancelled,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GameStatus::Completed | GameStatus::Abandoned | GameStatus::Ignored | GameStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Pending => "pending",
            GameStatus::DeckSelection => "deck_selection",
            GameStatus::Active => "active",
            GameStatus::Completed => "completed",
            GameStatus::Abandoned => "abandoned",
            GameStatus::Ignored => "ignored",
            GameStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A player's idempotent tiebreaker decision. `Undecided` until they submit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakerDecision {
    Undecided,
    Yes,
    No,
}

/// Per-player mutable state tracked while a game is `active`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlayerState {
    pub deck: Deck,
    pub hand: Hand,
    pub played_card: Option<Card>,
    pub drawn: bool,
    pub played: bool,
    pub score: u32,
    pub tiebreaker_decision: TiebreakerDecisionOpt,
}

/// Newtype so `PlayerState` can `derive(Default)` with `Undecided` as the
/// default tiebreaker decision without implementing `Default` on the public
/// enum (which would obscure that `Undecided` is a meaningful state, not an
/// absence of one).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiebreakerDecisionOpt(pub TiebreakerDecision);

impl Default for TiebreakerDecisionOpt {
    fn default() -> Self {
        TiebreakerDecisionOpt(TiebreakerDecision::Undecided)
    }
}

/// The full mutable game aggregate. Identical in shape to the row persisted
/// by `duel-db`; round history and per-player state are stored as structured
/// JSON columns, everything else as typed scalar columns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub player1: String,
    pub player2: String,
    pub status: GameStatus,
    pub turn: u32,
    pub player1_state: PlayerState,
    pub player2_state: PlayerState,
    pub history: Vec<RoundRecord>,
    pub awaiting_tiebreaker: bool,
    pub winner: Option<u8>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Game {
    /// `true` for either seat matching `username`.
    pub fn is_participant(&self, username: &str) -> bool {
        self.player1 == username || self.player2 == username
    }

    /// 1 if `username` is player1, 2 if player2, `None` otherwise.
    pub fn seat_of(&self, username: &str) -> Option<u8> {
        if self.player1 == username {
            Some(1)
        } else if self.player2 == username {
            Some(2)
        } else {
            None
        }
    }
}

// ── Archived game / history snapshot ─────────────────────────────────────────

/// Plaintext summary fields kept alongside an archived game's encrypted
/// payload so the leaderboard can query without decrypting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchivedGameSummary {
    pub game_id: Uuid,
    pub player1: String,
    pub player2: String,
    pub player1_score: u32,
    pub player2_score: u32,
    pub winner: Option<u8>,
    pub was_tie: bool,
    pub archived_at: Timestamp,
}

/// The canonical plaintext structure that gets serialized, encrypted, and
/// MAC'd when a game reaches a terminal transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub game_id: Uuid,
    pub turns_played: u32,
    pub player1: String,
    pub player2: String,
    pub player1_final_score: u32,
    pub player2_final_score: u32,
    pub player1_remaining_deck: Deck,
    pub player2_remaining_deck: Deck,
    pub winner: Option<u8>,
    pub was_tie: bool,
    pub history: Vec<RoundRecord>,
    pub created_at: Timestamp,
    pub archived_at: Timestamp,
}

/// An archived game row as read back from storage: encrypted payload plus
/// the plaintext summary used for listing/ranking.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchivedGame {
    pub summary: ArchivedGameSummary,
    pub ciphertext: Vec<u8>,
    pub mac_tag: [u8; 32],
}

// ── Account / sessions ────────────────────────────────────────────────────────

/// A persisted user account. The password hash is never included in any
/// type that gets serialized into an API response (see `duel-identity`'s
/// DTOs, which project this type field-by-field).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub enabled: bool,
    pub failed_login_attempts: u32,
    pub lock_until: Option<Timestamp>,
    pub last_failed_login: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Account {
    pub fn is_locked(&self, now: Timestamp) -> bool {
        self.lock_until.map(|until| until > now).unwrap_or(false)
    }
}

/// Outcome of the transactional login check in `duel_db::accounts::try_login`
/// (row-locked read, password verify, conditional counter/lock update, all
/// in one transaction per spec.md §4.1's numbered protocol).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LoginAttempt {
    Success(Account),
    InvalidCredentials { remaining_attempts: u32 },
    Locked { retry_after_secs: i64, locked_until: Timestamp },
    AccountDisabled,
}

/// Caller-supplied device metadata recorded with a refresh credential.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub device_label: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

/// A server-side refresh credential. Opaque to the client beyond its token
/// string; at most one non-revoked row may exist per account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshCredential {
    pub id: Uuid,
    pub account_id: Uuid,
    pub token: String,
    pub device: DeviceDescriptor,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub revoked: bool,
    pub revoked_at: Option<Timestamp>,
    pub last_used_at: Option<Timestamp>,
}

impl RefreshCredential {
    pub fn is_valid(&self, now: Timestamp) -> bool {
        !self.revoked && self.expires_at > now
    }
}

/// A redacted view of an active session, returned to the caller when a login
/// fails because another session is already active.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub device_label: Option<String>,
    pub ip: Option<String>,
    pub issued_at: Timestamp,
}

// ── Audit log ─────────────────────────────────────────────────────────────────

/// Closed set of security-sensitive events recorded by C6. Kept as an enum
/// rather than free strings so the gateway's log listing and any downstream
/// alerting can match on a stable vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AccountCreated,
    LoginSucceeded,
    LoginFailed,
    AccountLocked,
    PasswordChanged,
    ProfileUpdated,
    RefreshTokenIssued,
    RefreshTokenRevoked,
    AllSessionsRevoked,
    GameInvitationCreated,
    GameAccepted,
    GameIgnored,
    GameCancelled,
    GameStarted,
    GameCompleted,
    GameAbandoned,
    TiebreakerDecision,
    GameArchived,
    IntegrityViolationDetected,
    AdminViewedLogs,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::AccountCreated => "account_created",
            AuditAction::LoginSucceeded => "login_succeeded",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::AccountLocked => "account_locked",
            AuditAction::PasswordChanged => "password_changed",
            AuditAction::ProfileUpdated => "profile_updated",
            AuditAction::RefreshTokenIssued => "refresh_token_issued",
            AuditAction::RefreshTokenRevoked => "refresh_token_revoked",
            AuditAction::AllSessionsRevoked => "all_sessions_revoked",
            AuditAction::GameInvitationCreated => "game_invitation_created",
            AuditAction::GameAccepted => "game_accepted",
            AuditAction::GameIgnored => "game_ignored",
            AuditAction::GameCancelled => "game_cancelled",
            AuditAction::GameStarted => "game_started",
            AuditAction::GameCompleted => "game_completed",
            AuditAction::GameAbandoned => "game_abandoned",
            AuditAction::TiebreakerDecision => "tiebreaker_decision",
            AuditAction::GameArchived => "game_archived",
            AuditAction::IntegrityViolationDetected => "integrity_violation_detected",
            AuditAction::AdminViewedLogs => "admin_viewed_logs",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An append-only audit record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub action: AuditAction,
    pub actor: Option<String>,
    pub details: Option<String>,
    pub created_at: Timestamp,
}

// ── Leaderboard ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub win_ratio: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerStats {
    pub username: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub total_games: u32,
    pub win_ratio: f64,
    pub recent_games: Vec<ArchivedGameSummary>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_games: u64,
    pub total_completed: u64,
    pub average_rounds_per_game: f64,
    pub most_common_winning_suit: Option<Suit>,
}

/// Service identities recognized by the trust plane, used both as config
/// keys (`{service}_SERVICE_API_KEY`) and as caller whitelists on internal
/// RPC endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceName {
    Gateway,
    Identity,
    Cards,
    Persistence,
    Game,
    Leaderboard,
    Audit,
}

impl ServiceName {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceName::Gateway => "gateway",
            ServiceName::Identity => "identity",
            ServiceName::Cards => "cards",
            ServiceName::Persistence => "persistence",
            ServiceName::Game => "game",
            ServiceName::Leaderboard => "leaderboard",
            ServiceName::Audit => "audit",
        }
    }

    pub fn env_key(self) -> String {
        format!("{}_SERVICE_API_KEY", self.as_str().to_ascii_uppercase())
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
