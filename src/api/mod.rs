//! HTTP API
//!
//! Thin glue over the core components: routing, request validation and
//! response shaping. All state mutation happens inside the store's
//! exclusive section; all code handling goes through the registry and the
//! rate limiter.

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod error;

mod games;
mod login;
mod meta;
mod users;

pub use error::ApiError;

/// Nickname rule, as served to clients: English letters first, then
/// letters, digits, dash and underscore.
pub const NICK_PATTERN: &str = "^[A-Za-z][A-Za-z0-9-_]*$";

/// Check a nickname against [`NICK_PATTERN`].
pub fn is_valid_nickname(nickname: &str) -> bool {
    let mut chars = nickname.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .merge(meta::router())
        .merge(games::router())
        .merge(users::router())
        .merge(login::router())
}

#[cfg(test)]
mod tests;
