//! Read-only catalogue storage. The 39-row catalogue is generated once by
//! `duel-cards` and upserted here idempotently; this module never mutates it
//! afterwards.

use duel_core::error::DuelResult;
use duel_core::types::{Card, Suit};
use sqlx::FromRow;

use crate::db_err;
use crate::PersistenceContext;

#[derive(FromRow)]
struct CardRow {
    id: i32,
    suit: String,
    power: i16,
}

impl CardRow {
    fn into_card(self) -> Option<Card> {
        Suit::parse(&self.suit).map(|suit| Card::new(suit, self.power as u8))
    }
}

/// Idempotently inserts the full catalogue. Safe to call on every service
/// startup; `ON CONFLICT DO NOTHING` makes repeated calls a no-op.
pub async fn upsert_catalogue(ctx: &PersistenceContext, cards: &[Card]) -> DuelResult<()> {
    let mut tx = ctx.pool().begin().await.map_err(db_err)?;
    for card in cards {
        sqlx::query(
            r#"
            INSERT INTO cards (id, suit, power)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(card.catalogue_id() as i32)
        .bind(card.suit.as_str())
        .bind(card.power as i16)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
    }
    tx.commit().await.map_err(db_err)?;
    Ok(())
}

pub async fn list_all(ctx: &PersistenceContext) -> DuelResult<Vec<Card>> {
    let rows: Vec<CardRow> = sqlx::query_as("SELECT id, suit, power FROM cards ORDER BY id")
        .fetch_all(ctx.pool())
        .await
        .map_err(db_err)?;
    Ok(rows.into_iter().filter_map(CardRow::into_card).collect())
}

pub async fn list_by_suit(ctx: &PersistenceContext, suit: Suit) -> DuelResult<Vec<Card>> {
    let rows: Vec<CardRow> = sqlx::query_as(
        "SELECT id, suit, power FROM cards WHERE suit = $1 ORDER BY power",
    )
    .bind(suit.as_str())
    .fetch_all(ctx.pool())
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().filter_map(CardRow::into_card).collect())
}

pub async fn get_by_id(ctx: &PersistenceContext, id: u32) -> DuelResult<Option<Card>> {
    let row: Option<CardRow> = sqlx::query_as("SELECT id, suit, power FROM cards WHERE id = $1")
        .bind(id as i32)
        .fetch_optional(ctx.pool())
        .await
        .map_err(db_err)?;
    Ok(row.and_then(CardRow::into_card))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_row_rejects_unknown_suit() {
        let row = CardRow {
            id: 0,
            suit: "lizard".into(),
            power: 1,
        };
        assert!(row.into_card().is_none());
    }
}
