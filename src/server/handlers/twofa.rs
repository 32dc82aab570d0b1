//! 2FA lifecycle: setup (generate secret), enable (verify first code),
//! disable (step-up gated), status.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::auth::totp;
use crate::authz::Permission;
use crate::error::{AnchorError, AnchorResult};
use crate::server::middleware::{authenticate, require_permission, require_step_up};
use crate::server::state::AppState;
use crate::users::TwoFactor;

#[derive(Serialize)]
pub struct TwoFaStatus {
    enabled: bool,
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::ReadProfile)?;
    let two_fa = state.users.get_2fa(&claims.sub).map_err(AnchorError::Internal)?;
    Ok(Json(TwoFaStatus { enabled: two_fa.enabled }))
}

#[derive(Serialize)]
pub struct SetupResponse {
    secret: String,
    provisioning_uri: String,
}

/// Generates a secret and returns its provisioning URI, but does not persist
/// it yet — `enable` persists only after the user proves they've scanned it.
pub async fn setup(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::WriteProfile)?;

    let secret = totp::generate_secret();
    let uri = totp::provisioning_uri(&secret, "Anchor", &claims.sub);

    // Persist the pending secret disabled; `enable` flips it on.
    state
        .users
        .update_2fa(
            &claims.sub,
            &TwoFactor {
                enabled: false,
                secret: Some(STANDARD.encode(&secret)),
            },
        )
        .map_err(AnchorError::Internal)?;

    Ok(Json(SetupResponse {
        secret: STANDARD.encode(&secret),
        provisioning_uri: uri,
    }))
}

#[derive(Deserialize)]
pub struct EnableRequest {
    code: String,
}

pub async fn enable(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<EnableRequest>,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::WriteProfile)?;

    let mut two_fa = state.users.get_2fa(&claims.sub).map_err(AnchorError::Internal)?;
    let secret_b64 = two_fa
        .secret
        .clone()
        .ok_or_else(|| AnchorError::Invalid("call setup first".to_string()))?;
    let secret = STANDARD
        .decode(&secret_b64)
        .map_err(|e| AnchorError::Invalid(e.to_string()))?;

    let now = chrono::Utc::now().timestamp();
    if !totp::verify(&secret, &req.code, now) {
        return Err(AnchorError::Invalid("invalid code".to_string()));
    }

    two_fa.enabled = true;
    state.users.update_2fa(&claims.sub, &two_fa).map_err(AnchorError::Internal)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

pub async fn disable(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::WriteProfile)?;
    require_step_up(&claims)?;

    state
        .users
        .update_2fa(&claims.sub, &TwoFactor { enabled: false, secret: None })
        .map_err(AnchorError::Internal)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
