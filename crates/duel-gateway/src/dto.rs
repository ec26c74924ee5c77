//! Request/response shapes that differ between the client-facing contract
//! and an internal service's own wire format. Only the handful of fields
//! that actually rename or restructure are modeled here — everything else
//! passes through the proxy as an opaque JSON value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateGameClientRequest {
    pub player2_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateGameInternalRequest {
    pub invitee: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshClientRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshInternalRequest {
    pub refresh: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutClientRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogoutInternalRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileClientRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UpdatePasswordInternalRequest {
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeckCardType {
    #[serde(rename = "type")]
    pub suit: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectDeckClientRequest {
    pub deck: Vec<DeckCardType>,
}

#[derive(Debug, Serialize)]
pub struct SelectDeckInternalRequest {
    pub composition: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RandomDeckClientRequest {
    #[serde(default)]
    pub size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
