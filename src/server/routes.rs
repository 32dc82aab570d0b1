//! Route table. The HTTP routing layer itself is named an out-of-scope
//! collaborator; this is the minimal wiring needed to drive the core end to
//! end through `axum`.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{auth, repos, twofa, users};
use crate::server::state::AppState;

pub fn build(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/login/2fa", post(auth::login_2fa))
        .route("/refresh", post(auth::refresh))
        .route("/step-up", post(auth::step_up))
        .route("/logout", post(auth::logout))
        .route("/ssh-challenge", get(auth::ssh_challenge))
        .route("/ssh-login", post(auth::ssh_login));

    let repo_routes = Router::new()
        .route("/", post(repos::create_repo).get(repos::list_repos))
        .route("/{name}", get(repos::repo_metadata))
        .route("/{name}/history", get(repos::history))
        .route("/{name}/diff", get(repos::diff))
        .route("/{name}/tree/{sid}", get(repos::tree))
        .route("/{name}/file/{sid}/{*path}", get(repos::file))
        .route("/{name}/archive", get(repos::archive))
        .route("/{name}/save", post(repos::save))
        .route("/{name}/upload", post(repos::upload))
        .route("/{name}/favorite", patch(repos::favorite));

    let user_routes = Router::new()
        .route("/profile", get(users::get_profile).patch(users::update_profile))
        .route("/keys", get(users::list_keys).post(users::add_key))
        .route("/keys/{id}", axum::routing::delete(users::delete_key))
        .route("/rename", post(users::rename))
        .route("/password", post(users::change_password))
        .route("/2fa/status", get(twofa::status))
        .route("/2fa/setup", post(twofa::setup))
        .route("/2fa/enable", post(twofa::enable))
        .route("/2fa/disable", post(twofa::disable));

    Router::new()
        .route("/sys", get(repos::sys))
        .nest("/auth", auth_routes)
        .nest("/repos", repo_routes)
        .nest("/users", user_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
