use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};
use slotbook_core::models::availability::AvailabilityKey;
use slotbook_core::store::AvailabilityStore;
use tower::ServiceExt;
use uuid::Uuid;

use crate::test_utils::{availability_path, date, next_event, provider_key, TestContext};

#[tokio::test]
async fn test_generate_slots() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/slots/generate")
        .json(&json!({ "start_time": "09:00 AM", "end_time": "11:00 AM", "duration_minutes": 60 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0]["start"], "09:00 AM");
    assert_eq!(slots[0]["end"], "10:00 AM");
    assert_eq!(slots[1]["start"], "10:00 AM");
    assert_eq!(slots[1]["end"], "11:00 AM");
    assert_eq!(slots[0]["status"], "available");
    assert!(slots[0].get("source").is_none());
}

#[rstest]
#[case("11:00 AM", "09:00 AM", 60)]
#[case("09:00 AM", "09:00 AM", 60)]
#[case("09:00 AM", "11:00 AM", 0)]
#[case("09:00 AM", "11:00 AM", -15)]
#[tokio::test]
async fn test_generate_slots_rejects_invalid_range(
    #[case] start: &str,
    #[case] end: &str,
    #[case] duration: i64,
) {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/slots/generate")
        .json(&json!({ "start_time": start, "end_time": end, "duration_minutes": duration }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_unsaved_day_is_not_found() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;

    let response = ctx.server.get(&availability_path(id)).await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_and_get_availability() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;

    let saved = ctx.saved_day(id).await;
    assert_eq!(saved["version"], 1);
    assert_eq!(saved["slots"].as_array().unwrap().len(), 3);

    let fetched: Value = ctx.server.get(&availability_path(id)).await.json();
    assert_eq!(fetched, saved);
}

#[tokio::test]
async fn test_save_with_stale_version_conflicts() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;
    let saved = ctx.saved_day(id).await;

    let response = ctx
        .server
        .put(&availability_path(id))
        .json(&json!({ "slots": saved["slots"], "expected_version": 0 }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_protected_provider_needs_key_to_save() {
    let ctx = TestContext::new();
    let id = ctx.provider(Some("s3cret")).await;
    let body = json!({ "slots": [] });

    ctx.server
        .put(&availability_path(id))
        .json(&body)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let (name, wrong) = provider_key("wrong");
    ctx.server
        .put(&availability_path(id))
        .add_header(name, wrong)
        .json(&body)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let (name, value) = provider_key("s3cret");
    ctx.server
        .put(&availability_path(id))
        .add_header(name, value)
        .json(&body)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_open_slots_lists_only_available() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;
    let saved = ctx.saved_day(id).await;
    let busy_id = saved["slots"][0]["id"].as_str().unwrap();

    ctx.server
        .post(&format!("{}/slots/{}/status", availability_path(id), busy_id))
        .json(&json!({ "action": "mark_busy" }))
        .await
        .assert_status_ok();

    let open: Value = ctx
        .server
        .get(&format!("{}/open", availability_path(id)))
        .await
        .json();
    assert_eq!(open["availability_set"], true);
    let slots = open["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0]["label"], "10:00 AM - 11:00 AM");
    assert_eq!(slots[1]["label"], "11:00 AM - 12:00 PM");
}

#[tokio::test]
async fn test_open_slots_of_unsaved_day_is_empty() {
    let ctx = TestContext::new();

    let open: Value = ctx
        .server
        .get(&format!("{}/open", availability_path(Uuid::new_v4())))
        .await
        .json();

    assert_eq!(open["availability_set"], false);
    assert_eq!(open["slots"], json!([]));
}

#[tokio::test]
async fn test_open_slots_of_fully_taken_day() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;
    let saved = ctx.saved_day(id).await;

    for slot in saved["slots"].as_array().unwrap() {
        ctx.server
            .post(&format!("{}/slots/{}/status", availability_path(id), slot["id"].as_str().unwrap()))
            .json(&json!({ "action": "mark_busy" }))
            .await
            .assert_status_ok();
    }

    let open: Value = ctx
        .server
        .get(&format!("{}/open", availability_path(id)))
        .await
        .json();
    assert_eq!(open["availability_set"], true);
    assert_eq!(open["slots"], json!([]));
}

#[tokio::test]
async fn test_slot_status_changes() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;
    let saved = ctx.saved_day(id).await;
    let slot_id = saved["slots"][1]["id"].as_str().unwrap();
    let status_path = format!("{}/slots/{}/status", availability_path(id), slot_id);

    // Book in person
    let booked: Value = ctx
        .server
        .post(&status_path)
        .json(&json!({ "action": "book", "source": "Other: Phone call" }))
        .await
        .json();
    assert_eq!(booked["slots"][1]["status"], "booked");
    assert_eq!(booked["slots"][1]["source"], "Other: Phone call");
    assert_eq!(booked["version"], 2);

    // Booking again is a conflict
    ctx.server
        .post(&status_path)
        .json(&json!({ "action": "book", "source": "whatsapp" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    // Release needs confirmation
    ctx.server
        .post(&status_path)
        .json(&json!({ "action": "release" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let released: Value = ctx
        .server
        .post(&status_path)
        .json(&json!({ "action": "release", "confirm": true }))
        .await
        .json();
    assert_eq!(released["slots"][1]["status"], "available");
    assert!(released["slots"][1].get("source").is_none());
}

#[tokio::test]
async fn test_unknown_slot_is_not_found() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;
    ctx.saved_day(id).await;

    ctx.server
        .post(&format!("{}/slots/{}/status", availability_path(id), Uuid::new_v4()))
        .json(&json!({ "action": "mark_busy" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_slot() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;
    let saved = ctx.saved_day(id).await;
    let slot_id = saved["slots"][0]["id"].as_str().unwrap();
    let slot_path = format!("{}/slots/{}", availability_path(id), slot_id);

    let updated: Value = ctx.server.delete(&slot_path).await.json();
    assert_eq!(updated["slots"].as_array().unwrap().len(), 2);

    ctx.server
        .delete(&slot_path)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_changes_reach_subscribers() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;
    let key = AvailabilityKey::new(id, date());
    let mut subscription = ctx.store.subscribe_availability(key);

    let saved = ctx.saved_day(id).await;

    let document = tokio::time::timeout(Duration::from_secs(1), subscription.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(serde_json::to_value(&document).unwrap(), saved);
}

#[tokio::test]
async fn test_event_stream_sends_snapshot_then_changes() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;
    let saved = ctx.saved_day(id).await;

    let response = ctx
        .app()
        .oneshot(
            Request::get(format!("{}/events", availability_path(id)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "text/event-stream"
    );
    let mut body = response.into_body().into_data_stream();
    let mut buffer = String::new();

    let (name, snapshot) = next_event(&mut body, &mut buffer).await;
    assert_eq!(name, "availability");
    assert_eq!(snapshot, saved);

    let slot_id = saved["slots"][0]["id"].as_str().unwrap();
    ctx.server
        .post(&format!("{}/slots/{}/status", availability_path(id), slot_id))
        .json(&json!({ "action": "mark_busy" }))
        .await
        .assert_status_ok();

    let (name, changed) = next_event(&mut body, &mut buffer).await;
    assert_eq!(name, "availability");
    assert_eq!(changed["version"], 2);
    assert_eq!(changed["slots"][0]["status"], "busy");
}

#[tokio::test]
async fn test_event_stream_of_unsaved_day_waits_for_first_save() {
    let ctx = TestContext::new();
    let id = ctx.provider(None).await;

    let response = ctx
        .app()
        .oneshot(
            Request::get(format!("{}/events", availability_path(id)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut body = response.into_body().into_data_stream();
    let mut buffer = String::new();

    let saved = ctx.saved_day(id).await;

    // No snapshot for a day that did not exist, so the save comes first
    let (name, first) = next_event(&mut body, &mut buffer).await;
    assert_eq!(name, "availability");
    assert_eq!(first["version"], 1);
    assert_eq!(first, saved);
}
