//! Code redemption handler.
//!
//! The unauthenticated endpoint of the whole API, so it is the one the
//! rate limiter guards. Order matters: format gate first (free), then the
//! limiter (cheap), then the registry (consumes the code).

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::api::ApiError;
use crate::auth::RateDecision;
use crate::state::AppState;

/// Limiter classification for code redemption attempts.
pub const LOGIN_CODE_LIMITER: &str = "login-code";

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/user/login/code", post(login_with_code))
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(default)]
    code: String,
}

/// Exactly four digits, and not the all-zero string.
fn is_valid_code_format(code: &str) -> bool {
    code.len() == 4 && code.bytes().all(|b| b.is_ascii_digit()) && code != "0000"
}

async fn login_with_code(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_valid_code_format(&payload.code) {
        return Err(ApiError::BadRequest("Invalid code - bad format".into()));
    }

    match state
        .limiter
        .check(LOGIN_CODE_LIMITER, &addr.ip().to_string())
        .await
    {
        RateDecision::Allowed => {}
        RateDecision::Denied { retry_after, kind } => {
            return Err(ApiError::RateLimited { retry_after, kind });
        }
    }

    let user_id = state
        .codes
        .redeem(&payload.code)
        .await
        .ok_or_else(|| ApiError::Unprocessable("Code doesn't exist".into()))?;

    let db = state.store.load().await;
    let user = db
        .user_by_id(&user_id)
        .ok_or_else(|| ApiError::Unprocessable("Code doesn't exist".into()))?;

    // Full record, secret included: this response is what turns the second
    // device into an authenticated one.
    Ok(Json(json!({ "status": "ok", "user": user })))
}
