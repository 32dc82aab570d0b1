//! `/users/*`: profile, SSH keys, username/password changes. Rename, key
//! mutation and password change are step-up gated.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::authz::Permission;
use crate::error::{AnchorError, AnchorResult};
use crate::server::middleware::{authenticate, require_permission, require_step_up};
use crate::server::state::AppState;
use crate::users::Profile;

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::ReadProfile)?;
    let profile = state.users.get_profile(&claims.sub).map_err(AnchorError::Internal)?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(profile): Json<Profile>,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::WriteProfile)?;
    state
        .users
        .update_profile(&claims.sub, &profile)
        .map_err(AnchorError::Internal)?;
    Ok(Json(profile))
}

pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::ManageKeys)?;
    let keys = state.users.get_keys(&claims.sub).map_err(AnchorError::Internal)?;
    Ok(Json(keys))
}

#[derive(Deserialize)]
pub struct AddKeyRequest {
    title: String,
    key: String,
}

pub async fn add_key(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<AddKeyRequest>,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::ManageKeys)?;
    require_step_up(&claims)?;
    let key = state
        .users
        .add_key(&claims.sub, &req.title, &req.key)
        .map_err(AnchorError::Internal)?;
    Ok(Json(key))
}

pub async fn delete_key(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(key_id): Path<String>,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::ManageKeys)?;
    require_step_up(&claims)?;
    state
        .users
        .delete_key(&claims.sub, &key_id)
        .map_err(|e| AnchorError::NotFound(e.to_string()))?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct RenameRequest {
    new_username: String,
}

pub async fn rename(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<RenameRequest>,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::WriteProfile)?;
    require_step_up(&claims)?;
    state
        .users
        .rename_user(&claims.sub, &req.new_username)
        .map_err(|e| AnchorError::Conflict(e.to_string()))?;
    state
        .refresh_store
        .revoke_all_for_user(&claims.sub)
        .map_err(AnchorError::Internal)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct PasswordChangeRequest {
    new_password: String,
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<PasswordChangeRequest>,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::WriteProfile)?;
    require_step_up(&claims)?;

    let hash = crate::auth::password::hash(&req.new_password).map_err(AnchorError::Internal)?;
    state
        .users
        .update_password(&claims.sub, &hash)
        .map_err(AnchorError::Internal)?;
    state
        .refresh_store
        .revoke_all_for_user(&claims.sub)
        .map_err(AnchorError::Internal)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
