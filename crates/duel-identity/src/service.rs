//! Identity business logic: the seven public operations of spec.md §4.1,
//! wired to `duel_db::accounts` / `duel_db::tokens` for state and
//! `duel_crypto` for password hashing and token signing.

use chrono::Utc;
use duel_core::config::IdentityConfig;
use duel_core::error::{DuelError, DuelResult};
use duel_core::types::{Account, DeviceDescriptor, LoginAttempt, RefreshCredential};
use duel_crypto::TokenSigner;
use duel_db::PersistenceContext;
use uuid::Uuid;

pub enum LoginResult {
    Success { access: String, refresh: String },
    ConflictActiveSession(duel_core::types::SessionDescriptor),
    InvalidCredentials { remaining_attempts: u32 },
    Locked { retry_after_secs: i64, locked_until: chrono::DateTime<Utc> },
    AccountDisabled,
}

pub async fn register(
    db: &PersistenceContext,
    signer: &TokenSigner,
    config: &IdentityConfig,
    username: &str,
    password: &str,
) -> DuelResult<(Account, String, String)> {
    duel_crypto::validate_username_policy(username)?;
    duel_crypto::validate_password_policy(password)?;
    if duel_db::accounts::exists(db, username).await? {
        return Err(DuelError::conflict(format!("username already taken: {username}")));
    }
    let hash = duel_crypto::hash_password(password)?;
    let account = duel_db::accounts::create(db, username, &hash).await?;

    let access = signer.issue(&account.username, config.access_token_ttl.as_secs() as i64);
    let refresh = duel_crypto::generate_refresh_token();
    let expires_at = Utc::now() + chrono::Duration::from_std(config.refresh_token_ttl).unwrap_or(chrono::Duration::days(30));
    duel_db::tokens::issue_initial_session(db, account.id, &refresh, &DeviceDescriptor::default(), expires_at).await?;

    Ok((account, access, refresh))
}

pub async fn login(
    db: &PersistenceContext,
    signer: &TokenSigner,
    config: &IdentityConfig,
    username: &str,
    password: &str,
    device: DeviceDescriptor,
) -> DuelResult<LoginResult> {
    let attempt = duel_db::accounts::try_login(
        db,
        username,
        password,
        config.lockout_threshold,
        chrono::Duration::from_std(config.lockout_duration).unwrap_or(chrono::Duration::minutes(15)),
    )
    .await?;

    let account = match attempt {
        LoginAttempt::Success(account) => account,
        LoginAttempt::InvalidCredentials { remaining_attempts } => {
            return Ok(LoginResult::InvalidCredentials { remaining_attempts })
        }
        LoginAttempt::Locked { retry_after_secs, locked_until } => {
            return Ok(LoginResult::Locked { retry_after_secs, locked_until })
        }
        LoginAttempt::AccountDisabled => return Ok(LoginResult::AccountDisabled),
    };

    let access = signer.issue(&account.username, config.access_token_ttl.as_secs() as i64);
    let refresh = duel_crypto::generate_refresh_token();
    let expires_at = Utc::now() + chrono::Duration::from_std(config.refresh_token_ttl).unwrap_or(chrono::Duration::days(30));

    match duel_db::tokens::issue_session_or_conflict(db, account.id, &refresh, &device, expires_at).await? {
        Some(existing) => Ok(LoginResult::ConflictActiveSession(existing)),
        None => Ok(LoginResult::Success { access, refresh }),
    }
}

pub async fn refresh(
    db: &PersistenceContext,
    signer: &TokenSigner,
    config: &IdentityConfig,
    refresh_token: &str,
) -> DuelResult<String> {
    let credential: RefreshCredential = duel_db::tokens::validate_refresh(db, refresh_token).await?;
    let account = duel_db::accounts::fetch_by_id(db, credential.account_id)
        .await?
        .ok_or_else(|| DuelError::unauthenticated("subject no longer exists"))?;
    duel_db::tokens::touch_last_used(db, refresh_token, Utc::now()).await?;
    Ok(signer.issue(&account.username, config.access_token_ttl.as_secs() as i64))
}

pub async fn logout(db: &PersistenceContext, refresh_token: Option<&str>, subject: &Account) -> DuelResult<()> {
    match refresh_token {
        Some(token) => duel_db::tokens::revoke(db, token, Utc::now()).await,
        None => duel_db::tokens::revoke_all_for_account(db, subject.id, Utc::now()).await.map(|_| ()),
    }
}

pub async fn revoke_all(db: &PersistenceContext, caller: &Account, subject_username: &str) -> DuelResult<u64> {
    let subject = duel_db::accounts::fetch_by_username(db, subject_username)
        .await?
        .ok_or_else(|| DuelError::not_found(format!("no such account: {subject_username}")))?;
    if !caller.is_admin && caller.id != subject.id {
        return Err(DuelError::forbidden("can only revoke your own sessions"));
    }
    duel_db::tokens::revoke_all_for_account(db, subject.id, Utc::now()).await
}

pub async fn validate(signer: &TokenSigner, db: &PersistenceContext, access_token: &str) -> DuelResult<String> {
    let claims = signer
        .verify(access_token)
        .map_err(|e| DuelError::unauthenticated(format!("invalid access token: {e}")))?;
    let account = duel_db::accounts::fetch_by_username(db, &claims.sub)
        .await?
        .ok_or_else(|| DuelError::unauthenticated("subject no longer exists"))?;
    if !account.enabled {
        return Err(DuelError::unauthenticated("account disabled"));
    }
    Ok(account.username)
}

pub async fn update_password(
    db: &PersistenceContext,
    subject: &Account,
    new_password: &str,
) -> DuelResult<()> {
    duel_crypto::validate_password_policy(new_password)?;
    let hash = duel_crypto::hash_password(new_password)?;
    duel_db::accounts::update_password(db, &subject.username, &hash).await?;
    duel_db::tokens::revoke_all_for_account(db, subject.id, Utc::now()).await?;
    Ok(())
}

pub fn default_device(user_agent: Option<String>, ip: Option<String>, device_label: Option<String>) -> DeviceDescriptor {
    DeviceDescriptor { device_label, user_agent, ip }
}

pub fn access_ttl_secs(config: &IdentityConfig) -> i64 {
    config.access_token_ttl.as_secs() as i64
}
