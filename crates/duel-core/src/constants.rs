//! ─── Duel Protocol Constants ────────────────────────────────────────────────
//!
//! Card values, deck composition, and session/lockout policy shared by every
//! service so none of them can drift out of sync on what a "legal" deck or a
//! "locked" account means.

// ── Card catalogue ───────────────────────────────────────────────────────────

/// Number of suits in the catalogue (rock/paper/scissors, one suit each).
pub const SUIT_COUNT: usize = 3;

/// Cards per suit: power 1 through 13 inclusive.
pub const CARDS_PER_SUIT: u8 = 13;

/// Total catalogue size: 3 suits × 13 powers.
pub const TOTAL_CARDS: usize = SUIT_COUNT * CARDS_PER_SUIT as usize;

/// Minimum legal card power.
pub const MIN_POWER: u8 = 1;

/// Maximum legal card power.
pub const MAX_POWER: u8 = 13;

/// Fixed deck size: every player selects exactly this many suit entries at
/// deck-selection time, regardless of how many distinct powers exist.
pub const DECK_SIZE: usize = 22;

/// Upper bound accepted by `random-deck(size)` sampling from the 39-card pool.
pub const RANDOM_DECK_MAX_SIZE: usize = 50;

/// A deck with fewer than this many cards remaining ends the game for that
/// player (the opponent wins by depletion). Also the number of cards drawn
/// into a hand per turn (fewer only as the final draw before exhaustion).
pub const DRAW_SIZE: usize = 3;

/// Round number at which a running tie, with both decks still non-empty,
/// triggers the tiebreaker protocol instead of playing on indefinitely.
pub const TIEBREAKER_ROUND: u32 = 7;

// ── Identity / session policy ────────────────────────────────────────────────

/// Minimum username length.
pub const USERNAME_MIN_LEN: usize = 3;

/// Maximum username length.
pub const USERNAME_MAX_LEN: usize = 50;

/// Minimum password length.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Maximum password length.
pub const PASSWORD_MAX_LEN: usize = 128;

/// bcrypt cost factor used for password hashing.
pub const BCRYPT_COST: u32 = 12;

/// Failed login attempts before an account is locked.
pub const DEFAULT_LOCKOUT_THRESHOLD: u32 = 3;

/// Lockout duration in seconds.
pub const DEFAULT_LOCKOUT_DURATION_SECS: i64 = 15 * 60;

/// Default access token lifetime in seconds.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 24 * 3600;

/// Default refresh credential lifetime in seconds.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;

/// Length in bytes of a generated refresh token, before base64url encoding.
pub const REFRESH_TOKEN_BYTES: usize = 32;

// ── Leaderboard ───────────────────────────────────────────────────────────────

/// Maximum rows returned from a single leaderboard query.
pub const LEADERBOARD_MAX_LIMIT: usize = 200;

/// Default rows returned when a leaderboard query omits `limit`.
pub const LEADERBOARD_DEFAULT_LIMIT: usize = 50;

// ── Audit log ─────────────────────────────────────────────────────────────────

/// Default page size for `/api/logs/list`.
pub const LOG_DEFAULT_PAGE_SIZE: usize = 50;

/// Maximum page size for `/api/logs/list`.
pub const LOG_MAX_PAGE_SIZE: usize = 500;

// ── Gateway ───────────────────────────────────────────────────────────────────

/// Maximum accepted request body size, in bytes.
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

// ── Game history archival ─────────────────────────────────────────────────────

/// Fixed message returned by every mutating game operation once the game's
/// history has been archived.
pub const HISTORY_LOCK_MESSAGE: &str = "Game history is archived and cannot be modified";

/// Domain separation suffix mixed into the archival MAC key derivation, so a
/// key reused elsewhere cannot be replayed against archived history records.
pub const HISTORY_MAC_DOMAIN: &[u8] = b"|duel-backend-history|";
