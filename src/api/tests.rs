//! Router-level tests.
//!
//! These drive the real component stack (temp-file store, live registry
//! and limiter) through the router, the same way a client would.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use super::{is_valid_nickname, router};
use crate::auth::RateLimitConfig;
use crate::config::Config;
use crate::state::AppState;

fn test_state(max_attempts: usize) -> AppState {
    let dir = std::env::temp_dir().join(format!("noughts-api-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    AppState::new(Config {
        db_dir: dir,
        port: 0,
        rate_limit: RateLimitConfig {
            max_attempts,
            window: chrono::Duration::seconds(30),
        },
    })
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, nickname: &str) -> Value {
    let (status, body) = send(
        app,
        request("POST", "/api/user/new", Some(json!({ "nickname": nickname }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "registration failed: {body}");
    body["user"].clone()
}

fn sample_game(id: &str) -> Value {
    json!({
        "id": id,
        "state": "movingX",
        "moves": [[4, "X"]],
        "startTime": "2026-01-01T00:00:00.000Z",
        "winIdx": null,
        "players": { "X": "u1", "O": "u2" },
    })
}

#[tokio::test]
async fn nick_regex_is_served() {
    let app = router(test_state(5));
    let (status, body) = send(&app, request("GET", "/api/meta/nickRegex", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(is_valid_nickname("alice"));
    assert_eq!(body["regex"], "^[A-Za-z][A-Za-z0-9-_]*$");
}

#[tokio::test]
async fn registration_and_redacted_reads() {
    let app = router(test_state(5));
    let user = register(&app, "alice").await;
    assert_eq!(user["nickname"], "alice");
    assert!(user["secret"].is_string(), "registration returns the secret");

    let (status, body) = send(&app, request("GET", "/api/users", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"][0]["nickname"], "alice");
    assert!(body["users"][0].get("secret").is_none());

    let uri = format!("/api/user/{}", user["id"].as_str().unwrap());
    let (status, body) = send(&app, request("GET", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user"].get("secret").is_none());

    let (status, _) = send(&app, request("GET", "/api/user/nope", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registration_rejects_bad_and_duplicate_nicknames() {
    let app = router(test_state(5));

    let (status, body) = send(
        &app,
        request("POST", "/api/user/new", Some(json!({ "nickname": "9lives" }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["regex"], "^[A-Za-z][A-Za-z0-9-_]*$");

    register(&app, "alice").await;
    let (status, body) = send(
        &app,
        request("POST", "/api/user/new", Some(json!({ "nickname": "alice" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn concurrent_registration_yields_one_winner() {
    let app = router(test_state(5));

    let req = || request("POST", "/api/user/new", Some(json!({ "nickname": "alice" })));
    let ((a, _), (b, _)) = tokio::join!(send(&app, req()), send(&app, req()));

    let mut statuses = [a, b];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let (_, body) = send(&app, request("GET", "/api/users", None)).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn game_crud_round_trip() {
    let app = router(test_state(5));

    let (status, _) = send(&app, request("POST", "/api/game", Some(sample_game("g1")))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, request("GET", "/api/games", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["games"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, request("GET", "/api/game/g1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game"]["state"], "movingX");

    let mut updated = sample_game("g1");
    updated["state"] = json!("winX");
    updated["winIdx"] = json!(2);
    let (status, _) = send(&app, request("PATCH", "/api/game/g1", Some(updated))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, request("GET", "/api/game/g1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game"]["state"], "winX");
    assert_eq!(body["game"]["winIdx"], 2);
}

#[tokio::test]
async fn game_update_guards() {
    let app = router(test_state(5));
    send(&app, request("POST", "/api/game", Some(sample_game("g1")))).await;

    let (status, body) = send(
        &app,
        request("PATCH", "/api/game/g1", Some(sample_game("g2"))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Cannot change game ID");

    let (status, _) = send(
        &app,
        request("PATCH", "/api/game/g9", Some(sample_game("g9"))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, request("GET", "/api/game/g9", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn legacy_games_post_redirects() {
    let app = router(test_state(5));
    let (status, _) = send(&app, request("POST", "/api/games", Some(sample_game("g1")))).await;
    assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
}

#[tokio::test]
async fn code_login_flow() {
    let app = router(test_state(5));
    let user = register(&app, "alice").await;
    let user_id = user["id"].as_str().unwrap().to_string();
    let secret = user["secret"].as_str().unwrap().to_string();
    let code_uri = format!("/api/user/{user_id}/code");

    // No or wrong secret: refused.
    let (status, _) = send(&app, request("GET", &code_uri, None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let mut wrong = request("GET", &code_uri, None);
    wrong
        .headers_mut()
        .insert("X-Secret-String", "nope".parse().unwrap());
    let (status, _) = send(&app, wrong).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Right secret: a fresh 4-digit code.
    let mut issue = request("GET", &code_uri, None);
    issue
        .headers_mut()
        .insert("X-Secret-String", secret.parse().unwrap());
    let (status, body) = send(&app, issue).await;
    assert_eq!(status, StatusCode::OK);
    let code = body["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 4);
    assert_eq!(body["expiresInSeconds"], 15);

    // Redeem once: the full user record comes back.
    let (status, body) = send(
        &app,
        request("POST", "/api/user/login/code", Some(json!({ "code": code }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert_eq!(body["user"]["secret"], secret.as_str());

    // Redeem twice: spent.
    let (status, body) = send(
        &app,
        request("POST", "/api/user/login/code", Some(json!({ "code": code }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Code doesn't exist");
}

#[tokio::test]
async fn code_login_rejects_bad_format_without_spending_attempts() {
    let app = router(test_state(1));

    for bad in ["123", "12a4", "0000"] {
        let (status, _) = send(
            &app,
            request("POST", "/api/user/login/code", Some(json!({ "code": bad }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad} should be rejected");
    }

    // The format gate sits before the limiter, so those cost nothing.
    let (status, _) = send(
        &app,
        request("POST", "/api/user/login/code", Some(json!({ "code": "4242" }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn code_login_is_rate_limited() {
    let app = router(test_state(3));

    for _ in 0..3 {
        let (status, _) = send(
            &app,
            request("POST", "/api/user/login/code", Some(json!({ "code": "4242" }))),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    let (status, body) = send(
        &app,
        request("POST", "/api/user/login/code", Some(json!({ "code": "4242" }))),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["limiterType"], "login-code");
    assert!(body["retryAfter"].is_string());
}

#[test]
fn nickname_rules() {
    for ok in ["a", "Alice", "bob-42", "x_y_z", "Z9"] {
        assert!(is_valid_nickname(ok), "{ok} should pass");
    }
    for bad in ["", "9lives", "-dash", "_under", "émile", "a b", "a!"] {
        assert!(!is_valid_nickname(bad), "{bad} should fail");
    }
}
