//! Request-level auth: pulls the bearer token and device signals out of an
//! incoming request, verifies the token, and checks permissions. Not a
//! tower `Layer` — axum handlers call these helpers directly, which keeps
//! the step-up and ownership checks (which need per-route context) close to
//! the route that needs them instead of buried in opaque middleware.
//!
//! CORS, rate-limiting and the request-body validator are named
//! out-of-scope collaborators; `cors_passthrough` is the seam where a real
//! implementation would plug in.

use axum::http::HeaderMap;

use crate::auth::access_token::{self, Claims};
use crate::auth::fingerprint::{self, RequestSignals};
use crate::authz::{Permission, Role};
use crate::error::AnchorError;
use crate::server::state::AppState;

pub fn signals_from_headers(headers: &HeaderMap, peer: &str) -> RequestSignals {
    let header_str = |name: &str| -> String {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    };

    let forwarded_for = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok());
    let real_ip = headers.get("x-real-ip").and_then(|v| v.to_str().ok());
    let peer_ip = fingerprint::extract_peer_ip(forwarded_for, real_ip, peer);

    RequestSignals {
        user_agent: header_str("user-agent"),
        peer_ip,
        accept_language: header_str("accept-language"),
        accept_encoding: header_str("accept-encoding"),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    peer: &str,
) -> Result<Claims, AnchorError> {
    let token = bearer_token(headers)
        .ok_or_else(|| AnchorError::Unauthenticated("missing bearer token".to_string()))?;
    let signals = signals_from_headers(headers, peer);
    let fpt = fingerprint::compute(&signals);

    access_token::verify(&state.secret, token, Some(&fpt)).map_err(|e| {
        use access_token::TokenError::*;
        match e {
            Expired => AnchorError::Unauthenticated("token expired".to_string()),
            Invalid => AnchorError::Unauthenticated("invalid token".to_string()),
            FingerprintMismatch => {
                AnchorError::Unauthenticated("device fingerprint mismatch".to_string())
            }
        }
    })
}

/// Single-admin mode: the configured admin username maps to `Admin`, the
/// fixed `guest` login maps to `Guest`, and any other registered user (one
/// with a `users/<name>` directory) maps to `User`.
pub fn role_for(state: &AppState, username: &str) -> Role {
    if username == state.admin_username {
        Role::Admin
    } else if username == "guest" {
        Role::Guest
    } else {
        Role::User
    }
}

pub fn require_permission(
    state: &AppState,
    claims: &Claims,
    permission: Permission,
) -> Result<(), AnchorError> {
    let role = role_for(state, &claims.sub);
    if role.has_permission(permission) {
        Ok(())
    } else {
        Err(AnchorError::Forbidden(format!(
            "permission denied: {permission:?}"
        )))
    }
}

pub fn require_step_up(claims: &Claims) -> Result<(), AnchorError> {
    if access_token::has_fresh_step_up(claims) {
        Ok(())
    } else {
        Err(AnchorError::Forbidden(
            "step-up authentication required".to_string(),
        ))
    }
}
