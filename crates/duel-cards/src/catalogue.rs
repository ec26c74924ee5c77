//! The fixed 39-card catalogue (3 suits × 13 powers) and the sampling
//! operations C3 offers over it.

use duel_core::constants::{CARDS_PER_SUIT, MAX_POWER, MIN_POWER, RANDOM_DECK_MAX_SIZE, TOTAL_CARDS};
use duel_core::error::{DuelError, DuelResult};
use duel_core::types::{Card, Suit};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Generates the full 39-card catalogue, suit-major then by ascending power —
/// the same ordering `Card::catalogue_id` assumes.
pub fn generate_catalogue() -> Vec<Card> {
    let mut cards = Vec::with_capacity(TOTAL_CARDS);
    for suit in Suit::ALL {
        for power in MIN_POWER..=MAX_POWER {
            cards.push(Card::new(suit, power));
        }
    }
    cards
}

pub fn list_by_suit(suit: Suit) -> Vec<Card> {
    (MIN_POWER..=MAX_POWER).map(|power| Card::new(suit, power)).collect()
}

pub fn get_by_id(id: u32) -> Option<Card> {
    if id as usize >= TOTAL_CARDS {
        return None;
    }
    let suit = match id / CARDS_PER_SUIT as u32 {
        0 => Suit::Rock,
        1 => Suit::Paper,
        _ => Suit::Scissors,
    };
    let power = (id % CARDS_PER_SUIT as u32) as u8 + 1;
    Some(Card::new(suit, power))
}

/// Samples `size` distinct cards without replacement from the 39-card pool.
/// Fails `invalid` if `size` exceeds the pool or the protocol's upper bound.
pub fn random_deck(size: usize) -> DuelResult<Vec<Card>> {
    if size == 0 || size > RANDOM_DECK_MAX_SIZE || size > TOTAL_CARDS {
        return Err(DuelError::invalid(format!(
            "deck size must be between 1 and {}",
            RANDOM_DECK_MAX_SIZE.min(TOTAL_CARDS)
        )));
    }
    let catalogue = generate_catalogue();
    let mut rng = rand::thread_rng();
    Ok(catalogue.choose_multiple(&mut rng, size).copied().collect())
}

/// Draws one random card of the given suit (power uniform over 1..=13,
/// independent of prior draws) — used by deck selection to materialize a
/// player's suit-only composition into concrete cards with powers.
pub fn random_card_of_suit(suit: Suit) -> Card {
    let mut rng = rand::thread_rng();
    Card::new(suit, rng.gen_range(MIN_POWER..=MAX_POWER))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogueStats {
    pub total_cards: usize,
    pub rock_count: usize,
    pub paper_count: usize,
    pub scissors_count: usize,
    pub min_power: u8,
    pub max_power: u8,
}

pub fn stats() -> CatalogueStats {
    CatalogueStats {
        total_cards: TOTAL_CARDS,
        rock_count: CARDS_PER_SUIT as usize,
        paper_count: CARDS_PER_SUIT as usize,
        scissors_count: CARDS_PER_SUIT as usize,
        min_power: MIN_POWER,
        max_power: MAX_POWER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_exactly_39_cards() {
        assert_eq!(generate_catalogue().len(), TOTAL_CARDS);
    }

    #[test]
    fn catalogue_ids_are_unique_and_dense() {
        let mut ids: Vec<u32> = generate_catalogue().iter().map(|c| c.catalogue_id()).collect();
        ids.sort_unstable();
        let expected: Vec<u32> = (0..TOTAL_CARDS as u32).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn get_by_id_round_trips_with_catalogue_id() {
        for card in generate_catalogue() {
            assert_eq!(get_by_id(card.catalogue_id()), Some(card));
        }
    }

    #[test]
    fn random_deck_rejects_oversized_request() {
        assert!(random_deck(TOTAL_CARDS + 1).is_err());
    }

    #[test]
    fn random_deck_samples_without_replacement() {
        let deck = random_deck(TOTAL_CARDS).unwrap();
        let mut seen = std::collections::HashSet::new();
        for card in &deck {
            assert!(seen.insert((card.suit, card.power)), "duplicate in a without-replacement sample");
        }
    }

    #[test]
    fn random_card_of_suit_stays_in_bounds() {
        for _ in 0..50 {
            let card = random_card_of_suit(Suit::Paper);
            assert_eq!(card.suit, Suit::Paper);
            assert!((MIN_POWER..=MAX_POWER).contains(&card.power));
        }
    }
}
