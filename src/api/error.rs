//! API Error Responses
//!
//! Every error renders the same envelope the clients already parse:
//! `{"status": "error", "message": ...}` plus variant-specific fields.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use crate::api::NICK_PATTERN;

/// Handler-level failure.
///
/// Domain negatives (unknown game, bad nickname, spent code) each carry
/// their client-facing message; `Internal` is logged and hidden behind a
/// generic 500. A rate-limit denial is its own variant with retry
/// metadata — it is never folded into a hard error.
pub enum ApiError {
    /// Unexpected failure; logged, generic message to the client.
    Internal(anyhow::Error),
    /// Malformed request (bad code format, unparsable body).
    BadRequest(String),
    /// Resource does not exist.
    NotFound(String),
    /// Uniqueness violation (nickname already used).
    Conflict(String),
    /// Well-formed but unusable request (unknown user, wrong secret,
    /// spent code, id mismatch).
    Unprocessable(String),
    /// Nickname failed the pattern; the response carries the pattern so
    /// clients can show the rule.
    InvalidNickname,
    /// Redemption throttled.
    RateLimited {
        /// Instant after which a retry can be admitted.
        retry_after: DateTime<Utc>,
        /// Which limiter fired.
        kind: String,
    },
}

fn envelope(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "status": "error", "message": message })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Internal(err) => {
                tracing::error!("internal error: {err:?}");
                envelope(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            ApiError::BadRequest(msg) => envelope(StatusCode::BAD_REQUEST, &msg),
            ApiError::NotFound(msg) => envelope(StatusCode::NOT_FOUND, &msg),
            ApiError::Conflict(msg) => envelope(StatusCode::CONFLICT, &msg),
            ApiError::Unprocessable(msg) => envelope(StatusCode::UNPROCESSABLE_ENTITY, &msg),
            ApiError::InvalidNickname => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "status": "error",
                    "message": "Invalid nickname; only English letters, digits, dash - and underscore _ allowed; only letters first!",
                    "regex": NICK_PATTERN,
                })),
            )
                .into_response(),
            ApiError::RateLimited { retry_after, kind } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "status": "error",
                    "message": "Too many login attempts; try again later",
                    "retryAfter": retry_after.to_rfc3339_opts(SecondsFormat::Millis, true),
                    "limiterType": kind,
                })),
            )
                .into_response(),
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}
