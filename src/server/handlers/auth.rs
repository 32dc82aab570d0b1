//! `/auth/*`: password login (with optional 2FA step), refresh-token
//! rotation, step-up re-authentication, SSH challenge/response login, and
//! logout.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::auth::{access_token, fingerprint, password, ssh, totp};
use crate::error::{AnchorError, AnchorResult};
use crate::server::cookies;
use crate::server::middleware::signals_from_headers;
use crate::server::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Ok { access_token: String },
    TwoFactorRequired { status: String, username: String },
}

fn verify_credentials(state: &AppState, username: &str, password_attempt: &str) -> AnchorResult<()> {
    if username == "guest" && password_attempt == "guest" {
        return Ok(());
    }
    let hash = state
        .users
        .get_password_hash(username)
        .map_err(AnchorError::Internal)?
        .ok_or_else(|| AnchorError::Unauthenticated("invalid credentials".to_string()))?;
    if password::verify(password_attempt, &hash) {
        Ok(())
    } else {
        Err(AnchorError::Unauthenticated("invalid credentials".to_string()))
    }
}

fn issue_session(
    state: &AppState,
    username: &str,
    fingerprint: &str,
    step_up: bool,
) -> AnchorResult<(String, String)> {
    let access = access_token::issue(&state.secret, username, fingerprint, step_up)
        .map_err(AnchorError::Internal)?;
    let refresh = state
        .refresh_store
        .issue(username, fingerprint)
        .map_err(AnchorError::Internal)?;
    Ok((access, refresh))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AnchorResult<impl IntoResponse> {
    verify_credentials(&state, &req.username, &req.password)?;

    if req.username != "guest" {
        let two_fa = state.users.get_2fa(&req.username).map_err(AnchorError::Internal)?;
        if two_fa.enabled {
            return Ok(Json(LoginResponse::TwoFactorRequired {
                status: "2fa_required".to_string(),
                username: req.username,
            })
            .into_response());
        }
    }

    let signals = signals_from_headers(&headers, &peer.ip().to_string());
    let fpt = fingerprint::compute(&signals);
    let (access, refresh) = issue_session(&state, &req.username, &fpt, false)?;

    let mut response = Json(LoginResponse::Ok { access_token: access }).into_response();
    let (name, value) = cookies::set_refresh_cookie(&refresh);
    response.headers_mut().insert(name, value.parse().unwrap());
    Ok(response)
}

#[derive(Deserialize)]
pub struct TwoFaLoginRequest {
    username: String,
    password: String,
    code: String,
}

pub async fn login_2fa(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<TwoFaLoginRequest>,
) -> AnchorResult<impl IntoResponse> {
    verify_credentials(&state, &req.username, &req.password)?;

    let two_fa = state.users.get_2fa(&req.username).map_err(AnchorError::Internal)?;
    let secret = two_fa
        .secret
        .ok_or_else(|| AnchorError::Unauthenticated("2FA is not enabled".to_string()))?;
    let now = chrono::Utc::now().timestamp();
    if !totp::verify(secret.as_bytes(), &req.code, now) {
        return Err(AnchorError::Unauthenticated("invalid 2FA code".to_string()));
    }

    let signals = signals_from_headers(&headers, &peer.ip().to_string());
    let fpt = fingerprint::compute(&signals);
    let (access, refresh) = issue_session(&state, &req.username, &fpt, false)?;

    let mut response = Json(LoginResponse::Ok { access_token: access }).into_response();
    let (name, value) = cookies::set_refresh_cookie(&refresh);
    response.headers_mut().insert(name, value.parse().unwrap());
    Ok(response)
}

#[derive(Serialize)]
pub struct AccessTokenResponse {
    access_token: String,
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> AnchorResult<impl IntoResponse> {
    let token = cookies::read_refresh_token(&headers)
        .ok_or_else(|| AnchorError::Unauthenticated("missing refresh cookie".to_string()))?;

    let signals = signals_from_headers(&headers, &peer.ip().to_string());
    let fpt = fingerprint::compute(&signals);

    let (username, new_token) = state
        .refresh_store
        .validate_and_rotate(&token, &fpt)
        .map_err(|_| AnchorError::Unauthenticated("refresh token invalid".to_string()))?;

    let access = access_token::issue(&state.secret, &username, &fpt, false)
        .map_err(AnchorError::Internal)?;

    let mut response = Json(AccessTokenResponse { access_token: access }).into_response();
    let (name, value) = cookies::set_refresh_cookie(&new_token);
    response.headers_mut().insert(name, value.parse().unwrap());
    Ok(response)
}

#[derive(Deserialize)]
pub struct StepUpRequest {
    password: String,
    #[serde(default)]
    code: Option<String>,
}

pub async fn step_up(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<StepUpRequest>,
) -> AnchorResult<impl IntoResponse> {
    let claims = crate::server::middleware::authenticate(&state, &headers, &peer.ip().to_string())?;
    verify_credentials(&state, &claims.sub, &req.password)?;

    let two_fa = state.users.get_2fa(&claims.sub).map_err(AnchorError::Internal)?;
    if two_fa.enabled {
        let secret = two_fa
            .secret
            .ok_or_else(|| AnchorError::Unauthenticated("2FA is not enabled".to_string()))?;
        let code = req
            .code
            .ok_or_else(|| AnchorError::Unauthenticated("2FA code required".to_string()))?;
        let now = chrono::Utc::now().timestamp();
        if !totp::verify(secret.as_bytes(), &code, now) {
            return Err(AnchorError::Unauthenticated("invalid 2FA code".to_string()));
        }
    }

    let access = access_token::issue(&state.secret, &claims.sub, &claims.fpt, true)
        .map_err(AnchorError::Internal)?;
    Ok(Json(AccessTokenResponse { access_token: access }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AnchorResult<impl IntoResponse> {
    if let Some(token) = cookies::read_refresh_token(&headers) {
        state.refresh_store.revoke(&token).map_err(AnchorError::Internal)?;
    }
    let mut response = axum::http::StatusCode::NO_CONTENT.into_response();
    let (name, value) = cookies::clear_refresh_cookie();
    response.headers_mut().insert(name, value.parse().unwrap());
    Ok(response)
}

#[derive(Deserialize)]
pub struct SshChallengeQuery {
    username: String,
}

#[derive(Serialize)]
pub struct SshChallengeResponse {
    nonce: String,
}

pub async fn ssh_challenge(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SshChallengeQuery>,
) -> AnchorResult<impl IntoResponse> {
    let nonce = state.challenges.issue(&query.username);
    Ok(Json(SshChallengeResponse { nonce }))
}

#[derive(Deserialize)]
pub struct SshLoginRequest {
    username: String,
    signature: String,
}

pub async fn ssh_login(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<SshLoginRequest>,
) -> AnchorResult<impl IntoResponse> {
    let nonce = state
        .challenges
        .take(&req.username)
        .ok_or_else(|| AnchorError::Unauthenticated("no pending challenge".to_string()))?;

    let keys = state.users.get_keys(&req.username).map_err(AnchorError::Internal)?;
    let verified = keys.iter().any(|k| {
        ssh::verify_signature(&k.key, &nonce, &req.signature).unwrap_or(false)
    });
    if !verified {
        return Err(AnchorError::Unauthenticated("signature verification failed".to_string()));
    }

    let signals = signals_from_headers(&headers, &peer.ip().to_string());
    let fpt = fingerprint::compute(&signals);
    let (access, refresh_token) = issue_session(&state, &req.username, &fpt, false)?;

    let mut response = Json(AccessTokenResponse { access_token: access }).into_response();
    let (name, value) = cookies::set_refresh_cookie(&refresh_token);
    response.headers_mut().insert(name, value.parse().unwrap());
    Ok(response)
}
