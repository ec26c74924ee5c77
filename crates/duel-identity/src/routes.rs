//! Identity service HTTP surface. `/internal/auth/*` is reachable only from
//! the gateway (service credential); `Validate` is additionally reachable by
//! any peer service, since each of them needs to authorize end users itself.

use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use duel_core::config::IdentityConfig;
use duel_core::error::DuelError;
use duel_core::types::{Account, ServiceName};
use duel_crypto::TokenSigner;
use duel_trust::http::error_response;
use duel_trust::{require_service_key, require_user_auth, ServiceCredentials, TrustGuard, UserAuthState};

use crate::dto::{
    LoginRequest, LoginResponse, LogoutRequest, ProfileResponse, RefreshRequest, RefreshResponse,
    RegisterRequest, RegisterResponse, RevokeAllResponse, UpdatePasswordRequest, ValidateResponse,
};
use crate::service::{self, LoginResult};

#[derive(Clone)]
pub struct IdentityState {
    pub db: duel_db::PersistenceContext,
    pub signer: Arc<TokenSigner>,
    pub config: Arc<IdentityConfig>,
    pub audit: duel_audit::AuditClient,
}

const ALL_CALLERS: &[ServiceName] = &[
    ServiceName::Gateway,
    ServiceName::Identity,
    ServiceName::Cards,
    ServiceName::Game,
    ServiceName::Leaderboard,
    ServiceName::Audit,
];

const GATEWAY_ONLY: &[ServiceName] = &[ServiceName::Gateway];

pub fn router(state: IdentityState, credentials: Arc<ServiceCredentials>) -> Router {
    let user_auth = UserAuthState { signer: state.signer.clone(), db: state.db.clone() };
    let gateway_only = from_fn_with_state(TrustGuard::new(credentials.clone(), GATEWAY_ONLY), require_service_key);
    let any_service = from_fn_with_state(TrustGuard::new(credentials, ALL_CALLERS), require_service_key);
    let user_guard = from_fn_with_state(user_auth, require_user_auth);

    Router::new()
        .route("/internal/auth/register", post(register_handler).layer(gateway_only.clone()))
        .route("/internal/auth/login", post(login_handler).layer(gateway_only.clone()))
        .route("/internal/auth/refresh", post(refresh_handler).layer(gateway_only.clone()))
        .route(
            "/internal/auth/logout",
            post(logout_handler).layer(user_guard.clone()).layer(gateway_only.clone()),
        )
        .route(
            "/internal/auth/revoke-all/:username",
            post(revoke_all_handler).layer(user_guard.clone()).layer(gateway_only.clone()),
        )
        .route("/internal/auth/validate", get(validate_handler).layer(any_service))
        .route(
            "/internal/auth/profile",
            get(profile_handler).layer(user_guard.clone()).layer(gateway_only.clone()),
        )
        .route(
            "/internal/auth/profile/password",
            post(update_password_handler).layer(user_guard).layer(gateway_only),
        )
        .with_state(state)
}

async fn register_handler(State(state): State<IdentityState>, Json(req): Json<RegisterRequest>) -> Response {
    match service::register(&state.db, &state.signer, &state.config, &req.username, &req.password).await {
        Ok((account, access, refresh)) => {
            state.audit.log(
                duel_core::types::AuditAction::AccountCreated,
                Some(account.username.clone()),
                None,
            );
            Json(RegisterResponse { account_id: account.id, access, refresh }).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn login_handler(State(state): State<IdentityState>, Json(req): Json<LoginRequest>) -> Response {
    let device = service::default_device(req.user_agent, req.ip, req.device_label);
    match service::login(&state.db, &state.signer, &state.config, &req.username, &req.password, device).await {
        Ok(LoginResult::Success { access, refresh }) => {
            state.audit.log(duel_core::types::AuditAction::LoginSucceeded, Some(req.username), None);
            Json(LoginResponse::Success { access, refresh }).into_response()
        }
        Ok(LoginResult::ConflictActiveSession(session)) => {
            Json(LoginResponse::ConflictActiveSession { session }).into_response()
        }
        Ok(LoginResult::InvalidCredentials { remaining_attempts }) => {
            state.audit.log(duel_core::types::AuditAction::LoginFailed, Some(req.username), None);
            (
                axum::http::StatusCode::UNAUTHORIZED,
                Json(LoginResponse::InvalidCredentials { remaining_attempts }),
            )
                .into_response()
        }
        Ok(LoginResult::Locked { retry_after_secs, locked_until }) => {
            state.audit.log(duel_core::types::AuditAction::AccountLocked, Some(req.username), None);
            (
                axum::http::StatusCode::from_u16(423).unwrap(),
                Json(LoginResponse::Locked { retry_after_secs, locked_until }),
            )
                .into_response()
        }
        Ok(LoginResult::AccountDisabled) => {
            (axum::http::StatusCode::UNAUTHORIZED, Json(LoginResponse::AccountDisabled)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn refresh_handler(State(state): State<IdentityState>, Json(req): Json<RefreshRequest>) -> Response {
    match service::refresh(&state.db, &state.signer, &state.config, &req.refresh).await {
        Ok(access) => Json(RefreshResponse { access }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn logout_handler(
    State(state): State<IdentityState>,
    Extension(subject): Extension<Account>,
    Json(req): Json<LogoutRequest>,
) -> Response {
    match service::logout(&state.db, req.refresh.as_deref(), &subject).await {
        Ok(()) => {
            state.audit.log(duel_core::types::AuditAction::RefreshTokenRevoked, Some(subject.username), None);
            axum::http::StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn revoke_all_handler(
    State(state): State<IdentityState>,
    Extension(caller): Extension<Account>,
    Path(username): Path<String>,
) -> Response {
    match service::revoke_all(&state.db, &caller, &username).await {
        Ok(revoked) => {
            state.audit.log(
                duel_core::types::AuditAction::AllSessionsRevoked,
                Some(username),
                Some(format!("revoked_by={}", caller.username)),
            );
            Json(RevokeAllResponse { revoked }).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn validate_handler(State(state): State<IdentityState>, headers: axum::http::HeaderMap) -> Response {
    let Some(token) = duel_trust::http::bearer_token(&headers) else {
        return error_response(&DuelError::unauthenticated("missing bearer token"));
    };
    match service::validate(&state.signer, &state.db, token).await {
        Ok(subject) => Json(ValidateResponse { subject }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn profile_handler(Extension(subject): Extension<Account>) -> Response {
    Json(ProfileResponse::from(subject)).into_response()
}

async fn update_password_handler(
    State(state): State<IdentityState>,
    Extension(subject): Extension<Account>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Response {
    match service::update_password(&state.db, &subject, &req.new_password).await {
        Ok(()) => {
            state.audit.log(duel_core::types::AuditAction::PasswordChanged, Some(subject.username), None);
            axum::http::StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(&e),
    }
}
