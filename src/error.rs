//! The error taxonomy at the HTTP boundary.
//!
//! Internal logic (the object store, the snapshot engine, the client
//! commands) uses `anyhow::Result` throughout, same as the teacher's core
//! did. This enum exists at the seam where those errors need to become an
//! HTTP status code, so the taxonomy is closed and each variant maps onto
//! exactly one status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AnchorError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("rate limited")]
    RateLimited,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AnchorError {
    fn status(&self) -> StatusCode {
        match self {
            AnchorError::NotFound(_) => StatusCode::NOT_FOUND,
            AnchorError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AnchorError::Forbidden(_) => StatusCode::FORBIDDEN,
            AnchorError::Conflict(_) => StatusCode::CONFLICT,
            AnchorError::Invalid(_) => StatusCode::BAD_REQUEST,
            AnchorError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AnchorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AnchorError {
    fn into_response(self) -> Response {
        let status = self.status();
        if matches!(self, AnchorError::Internal(_)) {
            tracing::error!(err = %self, "internal error");
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

pub type AnchorResult<T> = Result<T, AnchorError>;
