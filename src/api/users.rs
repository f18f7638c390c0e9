//! User resource handlers.
//!
//! Registration and code login are the only responses that carry a user's
//! secret; every other read goes through the redacted [`PublicUser`]
//! projection.
//!
//! [`PublicUser`]: crate::store::PublicUser

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, SecondsFormat};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::{is_valid_nickname, ApiError};
use crate::auth::CODE_VALIDITY_MS;
use crate::state::AppState;
use crate::store::{PublicUser, User, UserStats};

/// Header carrying the caller's capability token.
const SECRET_HEADER: &str = "X-Secret-String";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/user/new", post(create_user))
        .route("/user/{user_id}", get(get_user))
        .route("/user/{user_id}/code", get(issue_code))
}

async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.store.load().await;
    let users: Vec<PublicUser> = db.users.iter().map(User::public).collect();
    Ok(Json(json!({ "status": "ok", "users": users })))
}

#[derive(Debug, Deserialize)]
struct NewUserPayload {
    #[serde(default)]
    nickname: String,
}

async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let nickname = payload.nickname;
    if !is_valid_nickname(&nickname) {
        return Err(ApiError::InvalidNickname);
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        nickname: nickname.clone(),
        secret: Uuid::new_v4().to_string(),
        stats: UserStats::default(),
        friends: Vec::new(),
    };

    // Uniqueness is checked on the same exclusive path that inserts, so
    // two concurrent registrations cannot both claim a nickname.
    let response = user.clone();
    let inserted = state
        .store
        .with_store(move |db| {
            if db.nickname_taken(&nickname) {
                false
            } else {
                db.users.push(user);
                true
            }
        })
        .await?;

    if !inserted {
        return Err(ApiError::Conflict(format!(
            "Nickname {} is already used",
            response.nickname
        )));
    }

    // The one response that includes the secret: this is the capability
    // grant the client stores.
    Ok(Json(json!({ "status": "ok", "user": response })))
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.store.load().await;
    match db.user_by_id(&user_id) {
        Some(user) => Ok(Json(json!({ "status": "ok", "user": user.public() }))),
        None => Err(ApiError::NotFound(format!(
            "User with ID {user_id} not found"
        ))),
    }
}

/// Mint a login code for a second device. The caller proves account
/// ownership with the secret header; the code itself carries no secret.
async fn issue_code(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let presented = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let db = state.store.load().await;
    let user = db
        .user_by_id(&user_id)
        .ok_or_else(|| ApiError::Unprocessable("User doesn't exist".into()))?;
    if user.secret != presented {
        return Err(ApiError::Unprocessable("Invalid secret".into()));
    }

    let issued = state
        .codes
        .issue(&user_id, Duration::milliseconds(CODE_VALIDITY_MS))
        .await;
    let expires_in = (issued.expires_at - issued.issued_at).num_seconds();

    Ok(Json(json!({
        "status": "ok",
        "code": issued.code,
        "issueDate": issued.issued_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        "expirationDate": issued.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        "expiresInSeconds": expires_in,
    })))
}
