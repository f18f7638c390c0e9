//! Game resource handlers.
//!
//! Games are opaque records to the server; clients own the rules. The
//! store only guarantees that concurrent writes never lose each other.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::api::ApiError;
use crate::state::AppState;
use crate::store::Game;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/games", get(list_games).post(legacy_create_redirect))
        .route("/game", post(create_game))
        .route("/game/{game_id}", get(get_game).patch(update_game))
}

async fn list_games(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.store.load().await;
    Ok(Json(json!({ "status": "ok", "games": db.games })))
}

/// Old clients POST the collection path; send them to the canonical one.
async fn legacy_create_redirect() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/api/game")])
}

async fn create_game(
    State(state): State<AppState>,
    Json(game): Json<Game>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.with_store(|db| db.games.push(game)).await?;
    Ok(Json(json!({ "status": "ok" })))
}

async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.store.load().await;
    match db.game_by_id(&game_id) {
        Some(game) => Ok(Json(json!({ "status": "ok", "game": game }))),
        None => Err(ApiError::NotFound(format!(
            "Game with ID {game_id} not found"
        ))),
    }
}

async fn update_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(updated): Json<Game>,
) -> Result<impl IntoResponse, ApiError> {
    if updated.id != game_id {
        return Err(ApiError::Unprocessable("Cannot change game ID".into()));
    }

    let found = state
        .store
        .with_store(|db| match db.game_by_id_mut(&game_id) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        })
        .await?;

    if !found {
        return Err(ApiError::NotFound(format!(
            "Game with ID {game_id} not found"
        )));
    }
    Ok(Json(json!({ "status": "ok" })))
}
