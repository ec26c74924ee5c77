//! End-user access-token authentication, shared by every service that
//! authorizes an end user directly (cards, game, leaderboard, audit) rather
//! than only a calling peer. Access tokens are stateless and
//! symmetric-key-signed, so any process holding `JWT_SECRET_KEY` can
//! validate one locally without a network round trip to the identity
//! service — `Validate` in spec.md §4.1 remains a distinct operation for
//! the explicit `/api/auth/validate` endpoint, but other services don't
//! need to call it just to authorize their own requests.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use duel_core::error::DuelError;
use duel_core::types::Account;
use duel_crypto::TokenSigner;
use duel_db::PersistenceContext;

use crate::http::{bearer_token, error_response};

#[derive(Clone)]
pub struct UserAuthState {
    pub signer: Arc<TokenSigner>,
    pub db: PersistenceContext,
}

/// Verifies the bearer token's signature and expiry, then confirms the
/// subject still exists and is enabled — the full condition spec.md §4.1's
/// `Validate` operation and the "disabled account on validate" failure mode
/// both describe.
pub async fn authenticate(state: &UserAuthState, headers: &axum::http::HeaderMap) -> Result<Account, DuelError> {
    let token = bearer_token(headers).ok_or_else(|| DuelError::unauthenticated("missing bearer token"))?;
    let claims = state
        .signer
        .verify(token)
        .map_err(|e| DuelError::unauthenticated(format!("invalid access token: {e}")))?;
    let account = duel_db::accounts::fetch_by_username(&state.db, &claims.sub)
        .await?
        .ok_or_else(|| DuelError::unauthenticated("subject no longer exists"))?;
    if !account.enabled {
        return Err(DuelError::unauthenticated("account disabled"));
    }
    Ok(account)
}

/// Middleware form of `authenticate`: on success, stashes the `Account` in
/// request extensions for handlers to pull out with `Extension<Account>`.
pub async fn require_user_auth(
    State(state): State<UserAuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()).await {
        Ok(account) => {
            request.extensions_mut().insert(account);
            next.run(request).await
        }
        Err(e) => error_response(&e),
    }
}
