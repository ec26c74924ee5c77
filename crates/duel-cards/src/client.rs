//! Thin HTTP client the game coordinator uses to materialize a player's
//! chosen suit composition into concrete cards, going through the trust
//! plane like any other internal hop.

use duel_core::error::{DuelError, DuelResult};
use duel_core::types::{Card, ServiceName, Suit};

#[derive(Clone)]
pub struct CardsClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl CardsClient {
    pub fn new(base_url: impl Into<String>) -> DuelResult<Self> {
        let service_key = duel_core::config::service_api_key(ServiceName::Game.as_str())?;
        Ok(Self { http: reqwest::Client::new(), base_url: base_url.into(), service_key })
    }

    pub async fn random_card_of_suit(&self, suit: Suit, access_token: &str) -> DuelResult<Card> {
        let url = format!("{}/internal/cards/random-card-of-suit/{}", self.base_url, suit.as_str());
        let resp = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .header(duel_trust::SERVICE_KEY_HEADER, &self.service_key)
            .send()
            .await
            .map_err(|e| DuelError::unavailable(format!("cards service unreachable: {e}")))?;

        if !resp.status().is_success() {
            return Err(DuelError::unavailable(format!(
                "cards service returned {}",
                resp.status()
            )));
        }
        resp.json::<Card>()
            .await
            .map_err(|e| DuelError::internal(format!("malformed cards service response: {e}")))
    }
}
