use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use slotbook_core::models::availability::AvailabilityKey;
use slotbook_core::models::booking::{BookSlotRequest, BookSlotResponse, Booking, Notification};
use slotbook_core::service::{ServiceRef, SlotSelector};
use slotbook_core::session::Session;
use std::sync::Arc;
use uuid::Uuid;

use crate::{middleware::{auth, error_handling::AppError}, ApiState};

/// Customer online booking, by slot id or by the slot's displayed label.
#[axum::debug_handler]
pub async fn book_slot(
    State(state): State<Arc<ApiState>>,
    Path((provider_id, date)): Path<(Uuid, NaiveDate)>,
    Json(payload): Json<BookSlotRequest>,
) -> Result<(StatusCode, Json<BookSlotResponse>), AppError> {
    let session = Session::customer(&payload.customer_id, &payload.customer_name)?;
    let selector = SlotSelector::from_request(payload.slot_id, payload.time.as_deref())?;
    let service = ServiceRef {
        id: payload.service_id,
        name: payload.service_name,
    };

    let (booking, document) = state
        .service
        .book(&session, AvailabilityKey::new(provider_id, date), selector, service)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BookSlotResponse {
            booking,
            availability_version: document.version,
        }),
    ))
}

#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<Arc<ApiState>>,
    Path(provider_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    let session = auth::authorize_provider(&state, provider_id, &headers).await?;
    let bookings = state.service.bookings(&session, provider_id).await?;
    Ok(Json(bookings))
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<ApiState>>,
    Path(provider_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Vec<Notification>>, AppError> {
    let session = auth::authorize_provider(&state, provider_id, &headers).await?;
    let notifications = state.service.notifications(&session, provider_id).await?;
    Ok(Json(notifications))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<Arc<ApiState>>,
    Path((provider_id, notification_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> Result<Json<Notification>, AppError> {
    let session = auth::authorize_provider(&state, provider_id, &headers).await?;
    let notification = state
        .service
        .mark_notification_read(&session, provider_id, notification_id)
        .await?;
    Ok(Json(notification))
}
