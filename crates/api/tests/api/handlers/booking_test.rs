use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use slotbook_core::errors::SlotError;
use slotbook_db::mock::MockMarketStore;
use slotbook_db::InMemoryStore;
use uuid::Uuid;

use crate::test_utils::{availability_path, provider_key, server_for, TestContext, DATE};

fn bookings_path(provider_id: Uuid) -> String {
    format!("{}/bookings", availability_path(provider_id))
}

#[test_log::test(tokio::test)]
async fn test_book_by_label() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;
    ctx.saved_day(id).await;

    let response = ctx
        .server
        .post(&bookings_path(id))
        .json(&json!({
            "customer_id": "customer-1",
            "customer_name": "Ada",
            "time": "10:00 AM - 11:00 AM",
            "service_name": "Haircut",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["booking"]["customer_name"], "Ada");
    assert_eq!(body["booking"]["slot_start"], "10:00 AM");
    assert_eq!(body["booking"]["date"], DATE);
    assert_eq!(body["booking"]["status"], "confirmed");
    assert_eq!(body["availability_version"], 2);

    let document: Value = ctx.server.get(&availability_path(id)).await.json();
    assert_eq!(document["slots"][1]["status"], "booked");
    assert_eq!(document["slots"][1]["source"], "online-booking");
}

#[test_log::test(tokio::test)]
async fn test_taken_slot_is_a_conflict() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;
    let saved = ctx.saved_day(id).await;
    let slot_id = saved["slots"][0]["id"].clone();

    ctx.server
        .post(&bookings_path(id))
        .json(&json!({ "customer_id": "c-1", "customer_name": "Ada", "slot_id": slot_id }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = ctx
        .server
        .post(&bookings_path(id))
        .json(&json!({ "customer_id": "c-2", "customer_name": "Grace", "slot_id": slot_id }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_booking_requires_customer_and_slot() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;
    ctx.saved_day(id).await;

    // Not logged in
    ctx.server
        .post(&bookings_path(id))
        .json(&json!({ "customer_id": "", "customer_name": "Ada", "time": "09:00 AM - 10:00 AM" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // No slot picked
    ctx.server
        .post(&bookings_path(id))
        .json(&json!({ "customer_id": "c-1", "customer_name": "Ada" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // A label that matches nothing
    ctx.server
        .post(&bookings_path(id))
        .json(&json!({ "customer_id": "c-1", "customer_name": "Ada", "time": "01:00 AM - 02:00 AM" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn test_store_failure_is_retryable() {
    let mut store = MockMarketStore::new();
    store
        .expect_get_availability()
        .returning(|_| Err(SlotError::StoreUnavailable(eyre::eyre!("connection refused"))));
    let server = server_for(Arc::new(store));

    let response = server
        .post(&bookings_path(Uuid::new_v4()))
        .json(&json!({ "customer_id": "c-1", "customer_name": "Ada", "time": "09:00 AM - 10:00 AM" }))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn test_slow_store_is_unavailable() {
    let ctx = TestContext::with_store(InMemoryStore::default().with_latency(Duration::from_secs(2)));

    let response = ctx
        .server
        .get(&format!("{}/open", availability_path(Uuid::new_v4())))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_provider_sees_bookings_and_notifications() {
    let ctx = TestContext::new();
    let id = ctx.provider(Some("s3cret")).await;
    let (name, value) = provider_key("s3cret");

    let saved: Value = ctx
        .server
        .put(&availability_path(id))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "slots": [
            { "id": Uuid::new_v4(), "start": "09:00 AM", "end": "10:00 AM", "status": "available" }
        ] }))
        .await
        .json();
    let slot_id = saved["slots"][0]["id"].clone();

    ctx.server
        .post(&bookings_path(id))
        .json(&json!({ "customer_id": "c-1", "customer_name": "Ada", "slot_id": slot_id }))
        .await
        .assert_status(StatusCode::CREATED);

    // Without the key
    ctx.server
        .get(&format!("/api/providers/{}/bookings", id))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let bookings: Value = ctx
        .server
        .get(&format!("/api/providers/{}/bookings", id))
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(bookings.as_array().unwrap().len(), 1);
    assert_eq!(bookings[0]["slot_id"], slot_id);

    let notifications: Value = ctx
        .server
        .get(&format!("/api/providers/{}/notifications", id))
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(notifications[0]["kind"], "new_booking");
    assert_eq!(notifications[0]["message"], "New booking from Ada");
    assert_eq!(notifications[0]["time"], "09:00 AM - 10:00 AM");
    assert_eq!(notifications[0]["read"], false);

    let notification_id = notifications[0]["id"].as_str().unwrap();
    let read: Value = ctx
        .server
        .post(&format!("/api/providers/{}/notifications/{}/read", id, notification_id))
        .add_header(name, value)
        .await
        .json();
    assert_eq!(read["read"], true);
}
