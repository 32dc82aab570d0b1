//! Minimal cookie handling for the one cookie this server sets: the
//! `refresh_token`. Not a general cookie jar — just enough to read and
//! write the single HttpOnly/SameSite=Strict cookie the auth endpoints use.

use axum::http::HeaderMap;
use axum::http::header::{COOKIE, SET_COOKIE};

use crate::auth::refresh::REFRESH_TOKEN_TTL_DAYS;

const COOKIE_NAME: &str = "refresh_token";

pub fn read_refresh_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    for part in raw.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(&format!("{COOKIE_NAME}=")) {
            return Some(value.to_string());
        }
    }
    None
}

pub fn set_refresh_cookie(token: &str) -> (axum::http::HeaderName, String) {
    let max_age = REFRESH_TOKEN_TTL_DAYS * 86_400;
    (
        SET_COOKIE,
        format!("{COOKIE_NAME}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age}"),
    )
}

pub fn clear_refresh_cookie() -> (axum::http::HeaderName, String) {
    (
        SET_COOKIE,
        format!("{COOKIE_NAME}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0"),
    )
}
