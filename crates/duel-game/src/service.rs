//! Game coordinator: the state machine of spec.md §4.4 over the live
//! `games` row, with every write going through `duel_db::games`'s
//! lock-then-save discipline so concurrent requests against the same game
//! serialize on the database row lock rather than racing in this process.

use chrono::Utc;
use duel_core::constants::{DECK_SIZE, DRAW_SIZE, HISTORY_LOCK_MESSAGE, TIEBREAKER_ROUND};
use duel_core::error::{DuelError, DuelResult};
use duel_core::types::{
    ArchivedGameSummary, AuditAction, Card, Deck, Game, GameStatus, Hand, HistorySnapshot, PlayerState,
    RoundRecord, RoundWinner, Suit, TiebreakerDecision, TiebreakerDecisionOpt,
};
use duel_crypto::HistoryCipher;
use duel_db::PersistenceContext;
use uuid::Uuid;

use duel_audit::AuditClient;
use duel_cards::CardsClient;

fn require_participant(game: &Game, caller: &str) -> DuelResult<u8> {
    game.seat_of(caller)
        .ok_or_else(|| DuelError::forbidden("not a participant in this game"))
}

fn state_ref(game: &Game, seat: u8) -> &PlayerState {
    if seat == 1 {
        &game.player1_state
    } else {
        &game.player2_state
    }
}

fn state_mut(game: &mut Game, seat: u8) -> &mut PlayerState {
    if seat == 1 {
        &mut game.player1_state
    } else {
        &mut game.player2_state
    }
}

/// Builds the canonical snapshot, encrypts it, and returns the pieces
/// `duel_db::history::archive` needs. Called once per terminal transition,
/// inside the same transaction as the live row's final `save`.
fn seal_archive(cipher: &HistoryCipher, game: &Game) -> DuelResult<(ArchivedGameSummary, Vec<u8>, String)> {
    let archived_at = Utc::now();
    let snapshot = HistorySnapshot {
        game_id: game.id,
        turns_played: game.turn,
        player1: game.player1.clone(),
        player2: game.player2.clone(),
        player1_final_score: game.player1_state.score,
        player2_final_score: game.player2_state.score,
        player1_remaining_deck: game.player1_state.deck.clone(),
        player2_remaining_deck: game.player2_state.deck.clone(),
        winner: game.winner,
        was_tie: game.winner.is_none(),
        history: game.history.clone(),
        created_at: game.created_at,
        archived_at,
    };
    let plaintext = serde_json::to_vec(&snapshot)?;
    let (ciphertext, tag) = cipher.encrypt(&plaintext);
    let summary = ArchivedGameSummary {
        game_id: game.id,
        player1: game.player1.clone(),
        player2: game.player2.clone(),
        player1_score: game.player1_state.score,
        player2_score: game.player2_state.score,
        winner: game.winner,
        was_tie: snapshot.was_tie,
        archived_at,
    };
    Ok((summary, ciphertext, hex::encode(tag)))
}

async fn reject_if_archived(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, game_id: Uuid) -> DuelResult<()> {
    if duel_db::games::is_archived(tx, game_id).await? {
        return Err(DuelError::conflict(HISTORY_LOCK_MESSAGE));
    }
    Ok(())
}

pub async fn create_game(db: &PersistenceContext, creator: &str, invitee: &str) -> DuelResult<Game> {
    if creator == invitee {
        return Err(DuelError::invalid("cannot invite yourself"));
    }
    if duel_db::accounts::fetch_by_username(db, invitee).await?.is_none() {
        return Err(DuelError::invalid(format!("no such account: {invitee}")));
    }
    duel_db::games::create(db, creator, invitee).await
}

pub async fn get_game(db: &PersistenceContext, caller: &str, game_id: Uuid) -> DuelResult<Game> {
    let game = duel_db::games::fetch(db, game_id).await?.ok_or_else(|| DuelError::not_found("no such game"))?;
    require_participant(&game, caller)?;
    Ok(game)
}

pub async fn accept(db: &PersistenceContext, caller: &str, game_id: Uuid) -> DuelResult<Game> {
    let mut tx = duel_db::begin(db).await?;
    if let Err(e) = reject_if_archived(&mut tx, game_id).await {
        duel_db::rollback(tx).await?;
        return Err(e);
    }
    let mut game = match duel_db::games::fetch_for_update(&mut tx, game_id).await {
        Ok(g) => g,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    if game.player2 != caller {
        duel_db::rollback(tx).await?;
        return Err(DuelError::forbidden("only the invitee may accept"));
    }
    if game.status != GameStatus::Pending {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("game is not awaiting acceptance"));
    }
    game.status = GameStatus::DeckSelection;
    duel_db::games::save(&mut tx, &game).await?;
    duel_db::commit(tx).await?;
    Ok(game)
}

async fn terminal_from_pending(
    db: &PersistenceContext,
    cipher: &HistoryCipher,
    caller: &str,
    game_id: Uuid,
    expect_seat: u8,
    target: GameStatus,
) -> DuelResult<Game> {
    let mut tx = duel_db::begin(db).await?;
    if let Err(e) = reject_if_archived(&mut tx, game_id).await {
        duel_db::rollback(tx).await?;
        return Err(e);
    }
    let mut game = match duel_db::games::fetch_for_update(&mut tx, game_id).await {
        Ok(g) => g,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    let seat = match require_participant(&game, caller) {
        Ok(s) => s,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    if seat != expect_seat {
        duel_db::rollback(tx).await?;
        return Err(DuelError::forbidden("caller is not permitted to perform this transition"));
    }
    if game.status != GameStatus::Pending {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("game is not in a state that permits this transition"));
    }
    game.status = target;
    game.winner = None;
    let (summary, ciphertext, tag) = seal_archive(cipher, &game)?;
    duel_db::games::save(&mut tx, &game).await?;
    duel_db::history::archive(&mut tx, &summary, &ciphertext, &tag).await?;
    duel_db::commit(tx).await?;
    Ok(game)
}

pub async fn ignore(db: &PersistenceContext, cipher: &HistoryCipher, caller: &str, game_id: Uuid) -> DuelResult<Game> {
    terminal_from_pending(db, cipher, caller, game_id, 2, GameStatus::Ignored).await
}

pub async fn cancel(db: &PersistenceContext, cipher: &HistoryCipher, caller: &str, game_id: Uuid) -> DuelResult<Game> {
    terminal_from_pending(db, cipher, caller, game_id, 1, GameStatus::Cancelled).await
}

/// Materializes a player's suit-only composition by calling the cards
/// service once per entry. Performed before any transaction is opened
/// (and re-validated under lock afterward) so the RPC round trips never
/// hold a database transaction open, per spec.md §5.
pub async fn select_deck(
    db: &PersistenceContext,
    cards: &CardsClient,
    access_token: &str,
    caller: &str,
    game_id: Uuid,
    composition: Vec<Suit>,
) -> DuelResult<Game> {
    if composition.len() != DECK_SIZE {
        return Err(DuelError::invalid(format!("deck composition must name exactly {DECK_SIZE} cards")));
    }

    let preview = duel_db::games::fetch(db, game_id).await?.ok_or_else(|| DuelError::not_found("no such game"))?;
    let seat = require_participant(&preview, caller)?;
    if preview.status != GameStatus::DeckSelection {
        return Err(DuelError::invalid("game is not in deck selection"));
    }
    if !state_ref(&preview, seat).deck.is_empty() {
        return Err(DuelError::invalid("deck already selected"));
    }

    let mut materialized = Vec::with_capacity(DECK_SIZE);
    for suit in composition {
        materialized.push(cards.random_card_of_suit(suit, access_token).await?);
    }

    let mut tx = duel_db::begin(db).await?;
    if let Err(e) = reject_if_archived(&mut tx, game_id).await {
        duel_db::rollback(tx).await?;
        return Err(e);
    }
    let mut game = match duel_db::games::fetch_for_update(&mut tx, game_id).await {
        Ok(g) => g,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    if game.status != GameStatus::DeckSelection {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("game is not in deck selection"));
    }
    let seat = match require_participant(&game, caller) {
        Ok(s) => s,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    if !state_ref(&game, seat).deck.is_empty() {
        duel_db::rollback(tx).await?;
        return Err(DuelError::conflict("deck already selected"));
    }
    state_mut(&mut game, seat).deck = Deck(materialized);

    if !game.player1_state.deck.is_empty() && !game.player2_state.deck.is_empty() {
        game.status = GameStatus::Active;
    }
    duel_db::games::save(&mut tx, &game).await?;
    duel_db::commit(tx).await?;
    Ok(game)
}

pub async fn draw_hand(db: &PersistenceContext, caller: &str, game_id: Uuid) -> DuelResult<Game> {
    let mut tx = duel_db::begin(db).await?;
    if let Err(e) = reject_if_archived(&mut tx, game_id).await {
        duel_db::rollback(tx).await?;
        return Err(e);
    }
    let mut game = match duel_db::games::fetch_for_update(&mut tx, game_id).await {
        Ok(g) => g,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    let seat = match require_participant(&game, caller) {
        Ok(s) => s,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    if game.status != GameStatus::Active {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("game is not active"));
    }
    let state = state_mut(&mut game, seat);
    if state.drawn {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("already drawn this turn"));
    }
    if state.deck.is_empty() {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("deck is empty"));
    }
    let n = DRAW_SIZE.min(state.deck.len());
    let mut indices: Vec<usize> = rand::seq::index::sample(&mut rand::thread_rng(), state.deck.len(), n).into_vec();
    indices.sort_unstable_by(|a, b| b.cmp(a));
    let drawn: Vec<Card> = indices.into_iter().map(|i| state.deck.0.remove(i)).collect();
    state.hand = Hand(drawn);
    state.drawn = true;

    duel_db::games::save(&mut tx, &game).await?;
    duel_db::commit(tx).await?;
    Ok(game)
}

fn resolve_current_round(game: &mut Game) {
    let p1_card = game.player1_state.played_card.take().expect("both played flags true implies both played_card set");
    let p2_card = game.player2_state.played_card.take().expect("both played flags true implies both played_card set");
    let winner = RoundWinner::resolve(p1_card, p2_card);
    match winner {
        RoundWinner::Player1 => game.player1_state.score += 1,
        RoundWinner::Player2 => game.player2_state.score += 1,
        RoundWinner::Tie => {}
    }
    game.history.push(RoundRecord {
        round_number: game.turn,
        player1_card: p1_card,
        player2_card: p2_card,
        winner,
        round_tied: winner == RoundWinner::Tie,
        player1_score_after: game.player1_state.score,
        player2_score_after: game.player2_state.score,
    });
    game.player1_state.hand = Hand::default();
    game.player2_state.hand = Hand::default();
    game.player1_state.drawn = false;
    game.player2_state.drawn = false;
    game.player1_state.played = false;
    game.player2_state.played = false;
}

fn apply_end_conditions(game: &mut Game) {
    let tied = game.player1_state.score == game.player2_state.score;
    let both_decks_nonempty = !game.player1_state.deck.is_empty() && !game.player2_state.deck.is_empty();

    if game.turn == TIEBREAKER_ROUND && tied && both_decks_nonempty {
        game.awaiting_tiebreaker = true;
        return;
    }

    let either_insufficient = game.player1_state.deck.len() < DRAW_SIZE || game.player2_state.deck.len() < DRAW_SIZE;
    if either_insufficient {
        if !tied {
            game.status = GameStatus::Completed;
            game.winner = Some(if game.player1_state.score > game.player2_state.score { 1 } else { 2 });
        } else if both_decks_nonempty {
            game.awaiting_tiebreaker = true;
        } else {
            game.status = GameStatus::Completed;
            game.winner = None;
        }
        return;
    }

    game.turn += 1;
}

/// Play + (if both participants have now played) the auto-resolve of
/// spec.md §4.4.3, in one transaction so no intermediate observer can see
/// both played-flags true without a corresponding history record.
pub async fn play_card(
    db: &PersistenceContext,
    cipher: &HistoryCipher,
    caller: &str,
    game_id: Uuid,
    card_index: usize,
) -> DuelResult<Game> {
    let mut tx = duel_db::begin(db).await?;
    if let Err(e) = reject_if_archived(&mut tx, game_id).await {
        duel_db::rollback(tx).await?;
        return Err(e);
    }
    let mut game = match duel_db::games::fetch_for_update(&mut tx, game_id).await {
        Ok(g) => g,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    let seat = match require_participant(&game, caller) {
        Ok(s) => s,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    if game.status != GameStatus::Active {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("game is not active"));
    }
    let state = state_mut(&mut game, seat);
    if !state.drawn || state.played {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("must draw before playing, and may only play once per turn"));
    }
    if card_index >= state.hand.len() {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("card index out of range"));
    }
    let card = state.hand.0[card_index];
    state.played_card = Some(card);
    state.hand = Hand::default();
    state.played = true;

    let mut archived = None;
    if game.player1_state.played && game.player2_state.played {
        resolve_current_round(&mut game);
        apply_end_conditions(&mut game);
        if game.status.is_terminal() {
            archived = Some(seal_archive(cipher, &game)?);
        }
    }

    duel_db::games::save(&mut tx, &game).await?;
    if let Some((summary, ciphertext, tag)) = &archived {
        duel_db::history::archive(&mut tx, summary, ciphertext, tag).await?;
    }
    duel_db::commit(tx).await?;
    Ok(game)
}

/// The external `/resolve-round` endpoint: auto-resolve already ran inline
/// with the second `play_card`, so this is a status check — `invalid` if no
/// round has resolved yet, otherwise the current state.
pub async fn resolve_round_status(db: &PersistenceContext, caller: &str, game_id: Uuid) -> DuelResult<Game> {
    let game = duel_db::games::fetch(db, game_id).await?.ok_or_else(|| DuelError::not_found("no such game"))?;
    require_participant(&game, caller)?;
    if game.history.is_empty() {
        return Err(DuelError::invalid("no round has been resolved yet"));
    }
    Ok(game)
}

pub async fn tiebreaker_decision(
    db: &PersistenceContext,
    cipher: &HistoryCipher,
    caller: &str,
    game_id: Uuid,
    decision: TiebreakerDecision,
) -> DuelResult<Game> {
    if decision == TiebreakerDecision::Undecided {
        return Err(DuelError::invalid("decision must be yes or no"));
    }
    let mut tx = duel_db::begin(db).await?;
    if let Err(e) = reject_if_archived(&mut tx, game_id).await {
        duel_db::rollback(tx).await?;
        return Err(e);
    }
    let mut game = match duel_db::games::fetch_for_update(&mut tx, game_id).await {
        Ok(g) => g,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    let seat = match require_participant(&game, caller) {
        Ok(s) => s,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    if !game.awaiting_tiebreaker {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("no tiebreaker is pending"));
    }
    state_mut(&mut game, seat).tiebreaker_decision = TiebreakerDecisionOpt(decision);

    let mut archived = None;
    let d1 = game.player1_state.tiebreaker_decision.0;
    let d2 = game.player2_state.tiebreaker_decision.0;
    if d1 == TiebreakerDecision::No || d2 == TiebreakerDecision::No {
        game.status = GameStatus::Completed;
        game.winner = None;
        game.awaiting_tiebreaker = false;
        archived = Some(seal_archive(cipher, &game)?);
    }

    duel_db::games::save(&mut tx, &game).await?;
    if let Some((summary, ciphertext, tag)) = &archived {
        duel_db::history::archive(&mut tx, summary, ciphertext, tag).await?;
    }
    duel_db::commit(tx).await?;
    Ok(game)
}

/// Runs only once both participants have recorded `Yes`: each plays their
/// remaining top card and the game ends per spec.md §4.4.6.
pub async fn tiebreaker_play(db: &PersistenceContext, cipher: &HistoryCipher, caller: &str, game_id: Uuid) -> DuelResult<Game> {
    let mut tx = duel_db::begin(db).await?;
    if let Err(e) = reject_if_archived(&mut tx, game_id).await {
        duel_db::rollback(tx).await?;
        return Err(e);
    }
    let mut game = match duel_db::games::fetch_for_update(&mut tx, game_id).await {
        Ok(g) => g,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    if let Err(e) = require_participant(&game, caller) {
        duel_db::rollback(tx).await?;
        return Err(e);
    }
    if !game.awaiting_tiebreaker {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("no tiebreaker is pending"));
    }
    let d1 = game.player1_state.tiebreaker_decision.0;
    let d2 = game.player2_state.tiebreaker_decision.0;
    if d1 != TiebreakerDecision::Yes || d2 != TiebreakerDecision::Yes {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("both players must agree to play the tiebreaker"));
    }
    if game.player1_state.deck.is_empty() || game.player2_state.deck.is_empty() {
        duel_db::rollback(tx).await?;
        return Err(DuelError::invalid("no cards remain for a tiebreaker round"));
    }

    let p1_card = game.player1_state.deck.0.remove(0);
    let p2_card = game.player2_state.deck.0.remove(0);
    let winner = RoundWinner::resolve(p1_card, p2_card);
    match winner {
        RoundWinner::Player1 => game.player1_state.score += 1,
        RoundWinner::Player2 => game.player2_state.score += 1,
        RoundWinner::Tie => {}
    }
    game.turn += 1;
    game.history.push(RoundRecord {
        round_number: game.turn,
        player1_card: p1_card,
        player2_card: p2_card,
        winner,
        round_tied: winner == RoundWinner::Tie,
        player1_score_after: game.player1_state.score,
        player2_score_after: game.player2_state.score,
    });
    game.awaiting_tiebreaker = false;
    game.status = GameStatus::Completed;
    game.winner = match winner {
        RoundWinner::Player1 => Some(1),
        RoundWinner::Player2 => Some(2),
        RoundWinner::Tie => None,
    };

    let (summary, ciphertext, tag) = seal_archive(cipher, &game)?;
    duel_db::games::save(&mut tx, &game).await?;
    duel_db::history::archive(&mut tx, &summary, &ciphertext, &tag).await?;
    duel_db::commit(tx).await?;
    Ok(game)
}

/// Explicit `EndGame`: forces an immediate terminal transition regardless of
/// where in the state machine the game currently sits, per spec.md §4.4.7's
/// "unconditionally on explicit EndGame".
pub async fn end_game(db: &PersistenceContext, cipher: &HistoryCipher, caller: &str, game_id: Uuid) -> DuelResult<Game> {
    let mut tx = duel_db::begin(db).await?;
    if let Err(e) = reject_if_archived(&mut tx, game_id).await {
        duel_db::rollback(tx).await?;
        return Err(e);
    }
    let mut game = match duel_db::games::fetch_for_update(&mut tx, game_id).await {
        Ok(g) => g,
        Err(e) => {
            duel_db::rollback(tx).await?;
            return Err(e);
        }
    };
    if let Err(e) = require_participant(&game, caller) {
        duel_db::rollback(tx).await?;
        return Err(e);
    }
    if game.status.is_terminal() {
        duel_db::rollback(tx).await?;
        return Err(DuelError::conflict("game has already ended"));
    }
    game.status = GameStatus::Abandoned;
    game.winner = None;
    game.awaiting_tiebreaker = false;

    let (summary, ciphertext, tag) = seal_archive(cipher, &game)?;
    duel_db::games::save(&mut tx, &game).await?;
    duel_db::history::archive(&mut tx, &summary, &ciphertext, &tag).await?;
    duel_db::commit(tx).await?;
    Ok(game)
}

pub async fn get_history(
    db: &PersistenceContext,
    cipher: &HistoryCipher,
    audit: &AuditClient,
    caller: &str,
    game_id: Uuid,
) -> DuelResult<HistorySnapshot> {
    let Some((summary, ciphertext, mac_hex)) = duel_db::history::fetch_sealed(db, game_id).await? else {
        return Err(DuelError::not_found("no archived history for this game"));
    };
    if summary.player1 != caller && summary.player2 != caller {
        return Err(DuelError::forbidden("not a participant in this game"));
    }
    let mac_bytes = hex::decode(&mac_hex).map_err(|_| DuelError::internal("corrupt MAC encoding in storage"))?;
    let mac_tag: [u8; 32] = mac_bytes
        .try_into()
        .map_err(|_| DuelError::internal("corrupt MAC length in storage"))?;

    match cipher.decrypt_and_verify(&ciphertext, &mac_tag) {
        Ok(plaintext) => Ok(serde_json::from_slice(&plaintext)?),
        Err(_) => {
            audit.log(
                AuditAction::IntegrityViolationDetected,
                Some(format!("game={game_id}")),
                None,
            );
            Err(DuelError::integrity_violation("archived history failed MAC verification"))
        }
    }
}

pub async fn list_for_participant(db: &PersistenceContext, username: &str) -> DuelResult<Vec<Game>> {
    duel_db::games::list_for_participant(db, username).await
}
