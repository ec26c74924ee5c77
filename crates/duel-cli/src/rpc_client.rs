//! Thin HTTP client over the gateway's public surface. Every call is a
//! plain JSON request/response pair; this module knows nothing about the
//! internal service topology behind the gateway.

use serde_json::{json, Value};

pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn register(&self, username: &str, password: &str) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        self.request(
            reqwest::Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        self.request(
            reqwest::Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    pub async fn create_game(&self, access: &str, player2_name: &str) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        self.request(
            reqwest::Method::POST,
            "/api/games",
            Some(access),
            Some(json!({ "player2_name": player2_name })),
        )
        .await
    }

    pub async fn get_game(&self, access: &str, game_id: &str) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        self.request(reqwest::Method::GET, &format!("/api/games/{game_id}"), Some(access), None).await
    }

    pub async fn accept(&self, access: &str, game_id: &str) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        self.request(reqwest::Method::POST, &format!("/api/games/{game_id}/accept"), Some(access), None).await
    }

    pub async fn select_deck(
        &self,
        access: &str,
        game_id: &str,
        composition: &[String],
    ) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        let deck: Vec<Value> = composition.iter().map(|suit| json!({ "type": suit })).collect();
        self.request(
            reqwest::Method::POST,
            &format!("/api/games/{game_id}/select-deck"),
            Some(access),
            Some(json!({ "deck": deck })),
        )
        .await
    }

    pub async fn draw_hand(&self, access: &str, game_id: &str) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        self.request(reqwest::Method::POST, &format!("/api/games/{game_id}/draw-hand"), Some(access), None).await
    }

    pub async fn play_card(
        &self,
        access: &str,
        game_id: &str,
        card_index: usize,
    ) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        self.request(
            reqwest::Method::POST,
            &format!("/api/games/{game_id}/play-card"),
            Some(access),
            Some(json!({ "card_index": card_index })),
        )
        .await
    }

    pub async fn leaderboard(&self, access: &str, limit: Option<u32>) -> anyhow::Result<(reqwest::StatusCode, Value)> {
        let path = match limit {
            Some(limit) => format!("/api/leaderboard?limit={limit}"),
            None => "/api/leaderboard".to_string(),
        };
        self.request(reqwest::Method::GET, &path, Some(access), None).await
    }
}
