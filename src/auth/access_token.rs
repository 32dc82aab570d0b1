//! Access tokens (C4): short-lived bearer tokens signed with a server
//! secret, bound to a device fingerprint, carrying an optional step-up bit.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_TTL_SECS: i64 = 5 * 60;
pub const STEP_UP_FRESHNESS_SECS: i64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub fpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_up: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_up_at: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("device fingerprint mismatch")]
    FingerprintMismatch,
}

pub fn issue(secret: &str, username: &str, fingerprint: &str, step_up: bool) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: username.to_string(),
        exp: now + ACCESS_TOKEN_TTL_SECS,
        fpt: fingerprint.to_string(),
        step_up: step_up.then_some(true),
        step_up_at: step_up.then_some(now),
    };
    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Verifies signature and expiry. If `request_fingerprint` is supplied, also
/// requires it to match the token's `fpt`.
pub fn verify(
    secret: &str,
    token: &str,
    request_fingerprint: Option<&str>,
) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    if let Some(fpt) = request_fingerprint {
        if fpt != data.claims.fpt {
            return Err(TokenError::FingerprintMismatch);
        }
    }

    Ok(data.claims)
}

/// Step-up must have been stamped within the last 300 seconds; otherwise
/// it's treated as absent.
pub fn has_fresh_step_up(claims: &Claims) -> bool {
    match (claims.step_up, claims.step_up_at) {
        (Some(true), Some(at)) => {
            let now = chrono::Utc::now().timestamp();
            now - at <= STEP_UP_FRESHNESS_SECS
        }
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_and_checks_fingerprint() {
        let secret = "test-secret";
        let token = issue(secret, "alice", "fpt-a", false).unwrap();

        let claims = verify(secret, &token, Some("fpt-a")).unwrap();
        assert_eq!(claims.sub, "alice");

        let err = verify(secret, &token, Some("fpt-b")).unwrap_err();
        assert!(matches!(err, TokenError::FingerprintMismatch));
    }

    #[test]
    fn step_up_must_be_fresh() {
        let secret = "test-secret";
        let token = issue(secret, "alice", "fpt-a", true).unwrap();
        let mut claims = verify(secret, &token, None).unwrap();
        assert!(has_fresh_step_up(&claims));

        claims.step_up_at = Some(chrono::Utc::now().timestamp() - 301);
        assert!(!has_fresh_step_up(&claims));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let err = verify("test-secret", "not-a-jwt", None).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }
}
