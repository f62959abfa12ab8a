use axum::http::StatusCode;
use fake::faker::company::en::CompanyName;
use fake::Fake;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::test_utils::TestContext;

#[tokio::test]
async fn test_create_and_get_provider() {
    let ctx = TestContext::new();
    let name: String = CompanyName().fake();

    // Create a provider without a password
    let response = ctx
        .server
        .post("/api/providers")
        .json(&json!({ "name": name }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["name"], name.as_str());
    assert_eq!(created["is_protected"], false);

    // Fetch it back
    let id = created["id"].as_str().unwrap();
    let fetched: Value = ctx.server.get(&format!("/api/providers/{}", id)).await.json();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_password_hash_is_never_returned() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/providers")
        .json(&json!({ "name": "Barber Joe", "password": "s3cret" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();

    assert_eq!(created["is_protected"], true);
    assert!(created.get("password_hash").is_none());
}

#[tokio::test]
async fn test_create_provider_requires_name() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/providers")
        .json(&json!({ "name": "   " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_unknown_provider() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .get(&format!("/api/providers/{}", Uuid::new_v4()))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_verify_password() {
    let ctx = TestContext::new();
    let id = ctx.provider(Some("s3cret")).await;
    let path = format!("/api/providers/{}/verify", id);

    let valid: Value = ctx
        .server
        .post(&path)
        .json(&json!({ "password": "s3cret" }))
        .await
        .json();
    assert_eq!(valid, json!({ "valid": true }));

    let invalid: Value = ctx
        .server
        .post(&path)
        .json(&json!({ "password": "guess" }))
        .await
        .json();
    assert_eq!(invalid, json!({ "valid": false }));
}

#[tokio::test]
async fn test_verify_password_of_open_provider_accepts_anything() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;

    let body: Value = ctx
        .server
        .post(&format!("/api/providers/{}/verify", id))
        .json(&json!({ "password": "anything" }))
        .await
        .json();

    assert_eq!(body["valid"], true);
}
