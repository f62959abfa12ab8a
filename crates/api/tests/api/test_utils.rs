use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;
use chrono::{NaiveDate, NaiveTime};
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use slotbook_api::{middleware::auth::PROVIDER_KEY_HEADER, ApiState};
use slotbook_core::service::AvailabilityService;
use slotbook_core::store::MarketStore;
use slotbook_db::InMemoryStore;
use uuid::Uuid;

pub const DATE: &str = "2024-05-01";

pub struct TestContext {
    pub server: TestServer,
    pub store: Arc<InMemoryStore>,
    app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_store(InMemoryStore::default())
    }

    pub fn with_store(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        let app = app_for(store.clone());
        let server = TestServer::new(app.clone()).unwrap();
        Self { server, store, app }
    }

    /// The router behind `server`, for requests whose response body never
    /// ends (event streams).
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Registers a provider and returns its id.
    pub async fn provider(&self, password: Option<&str>) -> Uuid {
        let response = self
            .server
            .post("/api/providers")
            .json(&json!({ "name": "Sunny Salon", "password": password }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
    }

    /// Saves a 09:00-12:00 day of one-hour slots and returns the stored document.
    pub async fn saved_day(&self, provider_id: Uuid) -> Value {
        let generated: Value = self
            .server
            .post("/api/slots/generate")
            .json(&json!({ "start_time": "09:00 AM", "end_time": "12:00 PM", "duration_minutes": 60 }))
            .await
            .json();

        let response = self
            .server
            .put(&availability_path(provider_id))
            .json(&json!({ "slots": generated["slots"] }))
            .await;
        response.assert_status_ok();
        response.json()
    }
}

pub fn app_for(store: Arc<dyn MarketStore>) -> Router {
    let service = AvailabilityService::new(store, Duration::from_millis(500));
    slotbook_api::app(Arc::new(ApiState { service }))
}

pub fn server_for(store: Arc<dyn MarketStore>) -> TestServer {
    TestServer::new(app_for(store)).unwrap()
}

/// Reads the next server-sent event from `body`, returning its name and JSON
/// data. Comment-only frames (keep-alives) are skipped.
pub async fn next_event<S, B, E>(body: &mut S, buffer: &mut String) -> (String, Value)
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Debug,
{
    loop {
        if let Some(end) = buffer.find("\n\n") {
            let frame: String = buffer.drain(..end + 2).collect();
            let mut name = String::new();
            let mut data = String::new();
            for line in frame.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    name = value.trim().to_string();
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push_str(value.trim_start());
                }
            }
            if data.is_empty() {
                continue;
            }
            return (name, serde_json::from_str(&data).unwrap());
        }

        let chunk = tokio::time::timeout(Duration::from_secs(1), body.next())
            .await
            .expect("no event within a second")
            .expect("event stream ended")
            .unwrap();
        buffer.push_str(std::str::from_utf8(chunk.as_ref()).unwrap());
    }
}

pub fn availability_path(provider_id: Uuid) -> String {
    format!("/api/providers/{}/availability/{}", provider_id, DATE)
}

pub fn provider_key(password: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(PROVIDER_KEY_HEADER),
        HeaderValue::from_str(password).unwrap(),
    )
}

pub fn date() -> NaiveDate {
    NaiveDate::parse_from_str(DATE, "%Y-%m-%d").unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}
