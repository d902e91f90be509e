mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{json, Value};
use tally::api::ListResponse;
use tally::auth::{Claims, Identity};
use tally::models::{Contact, Role};

use common::{spawn_app, PASSWORD};

#[tokio::test]
async fn health_is_open() {
    let app = spawn_app();

    let response = app.server.get("/api/health").await;

    response.assert_status_ok();
    response.assert_text("ok");
}

#[tokio::test]
async fn business_routes_require_a_token() {
    let app = spawn_app();

    let response = app.server.get("/api/deals").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = spawn_app();

    let response = app
        .server
        .get("/api/pipeline")
        .authorization_bearer("not-a-jwt")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = spawn_app();
    let past = (Utc::now().timestamp() - 3600) as usize;
    let token = app
        .state
        .tokens
        .sign(&Claims {
            id: app.admin.id,
            name: app.admin.name.clone(),
            email: app.admin.email.clone(),
            role: Role::Admin,
            iat: past - 60,
            exp: past,
        })
        .unwrap();

    let response = app.server.get("/api/deals").authorization_bearer(token).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_json(&json!({ "error": "token expired" }));
}

#[tokio::test]
async fn members_are_forbidden_from_business_routes() {
    let app = spawn_app();

    let response = app
        .server
        .get("/api/contacts")
        .authorization_bearer(&app.member_token)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn members_can_read_their_own_identity() {
    let app = spawn_app();

    let response = app
        .server
        .get("/api/auth/me")
        .authorization_bearer(&app.member_token)
        .await;

    response.assert_status_ok();
    let me: Identity = response.json();
    assert_eq!(me.email, "morgan@example.com");
    assert_eq!(me.role, Role::Member);
}

#[tokio::test]
async fn login_issues_a_working_token() {
    let app = spawn_app();

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "AVERY@example.com", "password": PASSWORD }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user"]["email"], "avery@example.com");
    assert!(body["user"].get("password_hash").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    let contacts = app
        .server
        .get("/api/contacts")
        .authorization_bearer(token)
        .await;
    contacts.assert_status_ok();
    let list: ListResponse<Contact> = contacts.json();
    assert_eq!(list.total, 0);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = spawn_app();

    let wrong = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "avery@example.com", "password": "nope" }))
        .await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);

    let unknown = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "nobody@example.com", "password": PASSWORD }))
        .await;
    unknown.assert_status(StatusCode::UNAUTHORIZED);

    let missing = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "avery@example.com" }))
        .await;
    missing.assert_status(StatusCode::BAD_REQUEST);
}
