//! `/repos/*`: repository lifecycle and the read/write surface over the
//! object store and snapshot engine.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Multipart, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::authz::Permission;
use crate::engine;
use crate::error::{AnchorError, AnchorResult};
use crate::meta::RepoMeta;
use crate::objects::{Snapshot, Tree};
use crate::server::middleware::{authenticate, require_permission, require_step_up};
use crate::server::state::AppState;
use crate::store::ObjectStore;

fn auth_ctx(
    state: &AppState,
    headers: &HeaderMap,
    peer: &SocketAddr,
    permission: Permission,
) -> AnchorResult<()> {
    let claims = authenticate(state, headers, &peer.ip().to_string())?;
    require_permission(state, &claims, permission)?;
    Ok(())
}

fn require_repo(state: &AppState, name: &str) -> AnchorResult<ObjectStore> {
    if !state.repo_exists(name) {
        return Err(AnchorError::NotFound(format!("repository {name} not found")));
    }
    Ok(ObjectStore::new(state.repo_root(name)))
}

#[derive(Deserialize)]
pub struct CreateRepoRequest {
    name: String,
}

pub async fn create_repo(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<CreateRepoRequest>,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::CreateRepo)?;
    require_step_up(&claims)?;

    if state.repo_exists(&req.name) {
        return Err(AnchorError::Conflict(format!("repository {} already exists", req.name)));
    }
    engine::init_repo(&state.svcs_root, &req.name).map_err(AnchorError::Internal)?;
    Ok(axum::http::StatusCode::CREATED)
}

pub async fn list_repos(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> AnchorResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers, &peer.ip().to_string())?;
    require_permission(&state, &claims, Permission::ReadRepo)?;

    let mut names = Vec::new();
    if let Ok(entries) = std::fs::read_dir(&state.svcs_root) {
        for entry in entries.flatten() {
            if entry.path().join("meta.json").is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
    }
    names.sort();
    Ok(axum::Json(names))
}

pub async fn repo_metadata(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> AnchorResult<impl IntoResponse> {
    auth_ctx(&state, &headers, &peer, Permission::ReadRepo)?;
    require_repo(&state, &name)?;
    let meta = RepoMeta::load(&state.repo_root(&name).join("meta.json")).map_err(AnchorError::Internal)?;
    Ok(axum::Json(meta))
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> AnchorResult<impl IntoResponse> {
    auth_ctx(&state, &headers, &peer, Permission::ReadSnapshot)?;
    let store = require_repo(&state, &name)?;

    let head = crate::refs::read_ref(&state.repo_root(&name).join("refs").join("main"))
        .map_err(AnchorError::Internal)?;
    let list: Vec<Snapshot> = match head {
        Some(id) => engine::get_history(&store, &id).map_err(AnchorError::Internal)?,
        None => Vec::new(),
    };
    Ok(axum::Json(list))
}

#[derive(Deserialize)]
pub struct DiffQuery {
    from: String,
    to: String,
}

pub async fn diff(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(query): Query<DiffQuery>,
) -> AnchorResult<impl IntoResponse> {
    auth_ctx(&state, &headers, &peer, Permission::ReadSnapshot)?;
    let store = require_repo(&state, &name)?;
    let result = engine::get_diff(&store, &query.from, &query.to).map_err(AnchorError::Internal)?;
    Ok(axum::Json(result))
}

pub async fn tree(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path((name, sid)): Path<(String, String)>,
) -> AnchorResult<impl IntoResponse> {
    auth_ctx(&state, &headers, &peer, Permission::ReadSnapshot)?;
    let store = require_repo(&state, &name)?;
    let snapshot = store
        .get_snapshot(&sid)
        .map_err(|_| AnchorError::NotFound(format!("snapshot {sid} not found")))?;
    let tree: Tree = store
        .get_tree(&snapshot.root_tree)
        .map_err(AnchorError::Internal)?;
    Ok(axum::Json(tree))
}

pub async fn file(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path((name, sid, path)): Path<(String, String, String)>,
) -> AnchorResult<impl IntoResponse> {
    auth_ctx(&state, &headers, &peer, Permission::ReadSnapshot)?;
    let store = require_repo(&state, &name)?;
    let snapshot = store
        .get_snapshot(&sid)
        .map_err(|_| AnchorError::NotFound(format!("snapshot {sid} not found")))?;
    let tree = store.get_tree(&snapshot.root_tree).map_err(AnchorError::Internal)?;
    let entry = tree
        .entries
        .get(&path)
        .ok_or_else(|| AnchorError::NotFound(format!("{path} not found in {sid}")))?;
    let bytes = store.get_blob(&entry.id).map_err(AnchorError::Internal)?;
    Ok(Bytes::from(bytes))
}

#[derive(Deserialize)]
pub struct ArchiveQuery {
    #[serde(rename = "ref")]
    reference: Option<String>,
}

pub async fn archive(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(query): Query<ArchiveQuery>,
) -> AnchorResult<impl IntoResponse> {
    auth_ctx(&state, &headers, &peer, Permission::ReadSnapshot)?;
    let store = require_repo(&state, &name)?;

    let snapshot_id = match query.reference {
        Some(id) => id,
        None => crate::refs::read_ref(&state.repo_root(&name).join("refs").join("main"))
            .map_err(AnchorError::Internal)?
            .ok_or_else(|| AnchorError::NotFound("repository has no snapshots yet".to_string()))?,
    };

    let zip_path = engine::create_archive(&store, &snapshot_id).map_err(AnchorError::Internal)?;
    let bytes = std::fs::read(&zip_path).map_err(|e| AnchorError::Internal(e.into()))?;
    let _ = std::fs::remove_file(&zip_path);
    Ok(Bytes::from(bytes))
}

#[derive(Deserialize)]
pub struct SaveRequest {
    message: String,
    work_dir: Utf8PathBuf,
}

pub async fn save(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(name): Path<String>,
    axum::Json(req): axum::Json<SaveRequest>,
) -> AnchorResult<impl IntoResponse> {
    auth_ctx(&state, &headers, &peer, Permission::WriteRepo)?;
    let store = require_repo(&state, &name)?;
    let repo_root = state.repo_root(&name);
    let id = engine::save_snapshot(
        &store,
        &repo_root,
        &repo_root.join("refs").join("main"),
        &req.message,
        &req.work_dir,
    )
    .map_err(AnchorError::Internal)?;
    Ok(axum::Json(serde_json::json!({ "snapshot_id": id })))
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(name): Path<String>,
    mut multipart: Multipart,
) -> AnchorResult<impl IntoResponse> {
    auth_ctx(&state, &headers, &peer, Permission::WriteRepo)?;
    let store = require_repo(&state, &name)?;

    let mut message = String::new();
    let mut zip_path: Option<Utf8PathBuf> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnchorError::Invalid(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "message" => {
                message = field
                    .text()
                    .await
                    .map_err(|e| AnchorError::Invalid(e.to_string()))?;
            }
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AnchorError::Invalid(e.to_string()))?;
                let tmp = tempfile::Builder::new()
                    .suffix(".zip")
                    .tempfile()
                    .map_err(|e| AnchorError::Internal(e.into()))?;
                std::fs::write(tmp.path(), &bytes).map_err(|e| AnchorError::Internal(e.into()))?;
                let (_file, path) = tmp.keep().map_err(|e| AnchorError::Internal(e.error.into()))?;
                zip_path = Some(
                    Utf8PathBuf::from_path_buf(path)
                        .map_err(|_| AnchorError::Invalid("upload path isn't UTF-8".to_string()))?,
                );
            }
            _ => {}
        }
    }

    let zip_path = zip_path.ok_or_else(|| AnchorError::Invalid("missing file field".to_string()))?;
    let repo_root = state.repo_root(&name);
    let id = engine::unzip_and_save_snapshot(
        &store,
        &repo_root,
        &repo_root.join("refs").join("main"),
        &message,
        &zip_path,
    )
    .map_err(AnchorError::Internal);
    let _ = std::fs::remove_file(&zip_path);
    let id = id?;

    Ok(axum::Json(serde_json::json!({ "snapshot_id": id })))
}

#[derive(Deserialize)]
pub struct FavoriteQuery {
    is_favorite: bool,
}

pub async fn favorite(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(query): Query<FavoriteQuery>,
) -> AnchorResult<impl IntoResponse> {
    auth_ctx(&state, &headers, &peer, Permission::WriteRepo)?;
    require_repo(&state, &name)?;

    let meta_path = state.repo_root(&name).join("meta.json");
    let mut meta = RepoMeta::load(&meta_path).map_err(AnchorError::Internal)?;
    meta.is_favorite = Some(query.is_favorite);
    meta.save(&meta_path).map_err(AnchorError::Internal)?;
    Ok(axum::Json(meta))
}

#[derive(Serialize)]
pub struct SysInfo {
    admin_username: String,
}

pub async fn sys(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    axum::Json(SysInfo {
        admin_username: state.admin_username.clone(),
    })
}
