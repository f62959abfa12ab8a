//! # Availability Handlers
//!
//! Slot generation, reading and saving a provider's day, provider-side slot
//! changes and the server-sent event stream of live updates.
//!
//! Provider-side handlers build a [`Session`](slotbook_core::session::Session)
//! through [`auth::authorize_provider`] before calling the service; reads and
//! the open-slot listing are public.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::NaiveDate;
use futures::stream::{self, Stream, StreamExt};
use slotbook_core::models::availability::{
    AvailabilityDocument, AvailabilityKey, GenerateSlotsRequest, GenerateSlotsResponse, OpenSlot,
    OpenSlotsResponse, SaveAvailabilityRequest, SlotStatusRequest,
};
use slotbook_core::models::slot::SlotId;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{middleware::{auth, error_handling::AppError}, ApiState};

/// Runs the slot generator. Nothing is stored; the provider reviews the
/// result and saves it separately.
#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<GenerateSlotsRequest>,
) -> Result<Json<GenerateSlotsResponse>, AppError> {
    let slots = state.service.generate(&payload)?;
    Ok(Json(GenerateSlotsResponse { slots }))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    Path((provider_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<AvailabilityDocument>, AppError> {
    let document = state
        .service
        .get(AvailabilityKey::new(provider_id, date))
        .await?;
    Ok(Json(document))
}

#[axum::debug_handler]
pub async fn save_availability(
    State(state): State<Arc<ApiState>>,
    Path((provider_id, date)): Path<(Uuid, NaiveDate)>,
    headers: HeaderMap,
    Json(payload): Json<SaveAvailabilityRequest>,
) -> Result<Json<AvailabilityDocument>, AppError> {
    let session = auth::authorize_provider(&state, provider_id, &headers).await?;

    let document = state
        .service
        .save(
            &session,
            AvailabilityKey::new(provider_id, date),
            payload.slots,
            payload.expected_version,
        )
        .await?;
    Ok(Json(document))
}

/// Slots customers can book, with the labels the booking form shows.
#[axum::debug_handler]
pub async fn open_slots(
    State(state): State<Arc<ApiState>>,
    Path((provider_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<OpenSlotsResponse>, AppError> {
    let slots = state
        .service
        .open_slots(AvailabilityKey::new(provider_id, date))
        .await?;

    Ok(Json(OpenSlotsResponse {
        provider_id,
        date,
        availability_set: slots.is_some(),
        slots: slots.iter().flatten().map(OpenSlot::from).collect(),
    }))
}

/// Streams the document as `availability` events: the current state first
/// (if saved), then every committed change. Each event carries the document
/// `version`.
pub async fn availability_events(
    State(state): State<Arc<ApiState>>,
    Path((provider_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let key = AvailabilityKey::new(provider_id, date);

    // Subscribe before reading so no write falls between the two
    let subscription = state.service.subscribe(key);
    let snapshot = state.service.find(key).await?;
    debug!("Opened availability stream for {}", key);

    let initial = stream::iter(snapshot);
    let updates = stream::unfold(subscription, |mut subscription| async move {
        let document = subscription.next().await?;
        Some((document, subscription))
    });

    let events = initial.chain(updates).filter_map(|document| async move {
        match Event::default().event("availability").json_data(&document) {
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                warn!("Dropping availability event for {}: {}", document.key(), err);
                None
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[axum::debug_handler]
pub async fn set_slot_status(
    State(state): State<Arc<ApiState>>,
    Path((provider_id, date, slot_id)): Path<(Uuid, NaiveDate, Uuid)>,
    headers: HeaderMap,
    Json(payload): Json<SlotStatusRequest>,
) -> Result<Json<AvailabilityDocument>, AppError> {
    let session = auth::authorize_provider(&state, provider_id, &headers).await?;

    let document = state
        .service
        .set_slot_status(
            &session,
            AvailabilityKey::new(provider_id, date),
            SlotId(slot_id),
            payload.transition,
            payload.confirm,
        )
        .await?;
    Ok(Json(document))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<ApiState>>,
    Path((provider_id, date, slot_id)): Path<(Uuid, NaiveDate, Uuid)>,
    headers: HeaderMap,
) -> Result<Json<AvailabilityDocument>, AppError> {
    let session = auth::authorize_provider(&state, provider_id, &headers).await?;

    let document = state
        .service
        .delete_slot(&session, AvailabilityKey::new(provider_id, date), SlotId(slot_id))
        .await?;
    Ok(Json(document))
}
