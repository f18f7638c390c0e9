//! Metadata handlers.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::api::NICK_PATTERN;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/meta/nickRegex", get(nick_regex))
}

/// Clients validate nicknames locally before registering; serve them the
/// same rule the server enforces.
async fn nick_regex() -> impl IntoResponse {
    Json(json!({ "status": "ok", "regex": NICK_PATTERN }))
}
