//! # In-Memory Store
//!
//! Process-local implementation of the store contracts. Used by tests and by
//! `STORE_BACKEND=memory` for running the API without PostgreSQL. One write
//! lock guards all documents, which makes every transition atomic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use slotbook_core::errors::{SlotError, SlotResult};
use slotbook_core::models::availability::{AvailabilityDocument, AvailabilityKey};
use slotbook_core::models::booking::{
    Booking, BookingStatus, NewBooking, NewNotification, Notification,
};
use slotbook_core::models::provider::Provider;
use slotbook_core::models::slot::{BookingSource, Slot, SlotId, SlotStatus};
use slotbook_core::store::{
    AvailabilityStore, AvailabilitySubscription, BookingStore, ChangeFeed, ProviderStore,
};
use slotbook_core::transition::{apply_transition, SlotTransition};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct State {
    documents: HashMap<AvailabilityKey, AvailabilityDocument>,
    bookings: Vec<Booking>,
    notifications: Vec<Notification>,
    providers: HashMap<Uuid, Provider>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    feed: ChangeFeed,
    latency: Option<Duration>,
    fail_bookings: AtomicBool,
}

impl InMemoryStore {
    pub fn new(feed: ChangeFeed) -> Self {
        Self {
            feed,
            ..Self::default()
        }
    }

    /// Delays every call by `latency`, simulating a remote round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes `book_slot` fail, before anything is written, until switched
    /// off again.
    pub fn fail_bookings(&self, fail: bool) {
        self.fail_bookings.store(fail, Ordering::SeqCst);
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    async fn round_trip(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn commit(&self, document: &mut AvailabilityDocument) {
        document.version += 1;
        document.updated_at = Utc::now();
        self.feed.publish(document);
    }
}

fn not_saved(key: AvailabilityKey) -> SlotError {
    SlotError::NotFound(format!("No availability set for {}", key))
}

fn slot_missing(key: AvailabilityKey, slot_id: SlotId) -> SlotError {
    SlotError::SlotNotFound(format!("slot {} in {}", slot_id, key))
}

#[async_trait]
impl AvailabilityStore for InMemoryStore {
    async fn get_availability(&self, key: AvailabilityKey) -> SlotResult<Option<AvailabilityDocument>> {
        self.round_trip().await;
        Ok(self.state.read().await.documents.get(&key).cloned())
    }

    async fn set_availability(
        &self,
        key: AvailabilityKey,
        slots: Vec<Slot>,
        expected_version: Option<i64>,
    ) -> SlotResult<AvailabilityDocument> {
        self.round_trip().await;
        let mut state = self.state.write().await;

        let actual = state.documents.get(&key).map_or(0, |doc| doc.version);
        if let Some(expected) = expected_version {
            if actual != expected {
                return Err(SlotError::VersionConflict { expected, actual });
            }
        }

        let document = state
            .documents
            .entry(key)
            .or_insert_with(|| AvailabilityDocument {
                provider_id: key.provider_id,
                date: key.date,
                slots: Vec::new(),
                updated_at: Utc::now(),
                version: 0,
            });
        document.slots = slots;
        self.commit(document);

        debug!("Stored {} at version {}", key, document.version);
        Ok(document.clone())
    }

    async fn transition_slot(
        &self,
        key: AvailabilityKey,
        slot_id: SlotId,
        transition: SlotTransition,
    ) -> SlotResult<AvailabilityDocument> {
        self.round_trip().await;
        let mut state = self.state.write().await;

        let document = state.documents.get_mut(&key).ok_or_else(|| not_saved(key))?;
        let slot = document
            .find_slot_mut(slot_id)
            .ok_or_else(|| slot_missing(key, slot_id))?;

        if apply_transition(slot, &transition)? {
            self.commit(document);
        }
        Ok(document.clone())
    }

    async fn remove_slot(&self, key: AvailabilityKey, slot_id: SlotId) -> SlotResult<AvailabilityDocument> {
        self.round_trip().await;
        let mut state = self.state.write().await;

        let document = state.documents.get_mut(&key).ok_or_else(|| not_saved(key))?;
        let position = document
            .slots
            .iter()
            .position(|slot| slot.id == slot_id)
            .ok_or_else(|| slot_missing(key, slot_id))?;

        document.slots.remove(position);
        self.commit(document);
        Ok(document.clone())
    }

    fn subscribe_availability(&self, key: AvailabilityKey) -> AvailabilitySubscription {
        self.feed.subscribe(key)
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn book_slot(&self, key: AvailabilityKey, new_booking: NewBooking) -> SlotResult<(Booking, AvailabilityDocument)> {
        self.round_trip().await;
        if self.fail_bookings.load(Ordering::SeqCst) {
            return Err(SlotError::StoreUnavailable(eyre::eyre!(
                "booking writes are switched off"
            )));
        }

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let document = state.documents.get_mut(&key).ok_or_else(|| not_saved(key))?;
        let slot_id = new_booking.slot_id;
        let slot = document
            .find_slot_mut(slot_id)
            .ok_or_else(|| slot_missing(key, slot_id))?;

        let online = SlotStatus::Booked {
            source: BookingSource::OnlineBooking,
        };
        if slot.status == online {
            let latest = state
                .bookings
                .iter()
                .rev()
                .filter(|booking| booking.status == BookingStatus::Confirmed)
                .find(|booking| {
                    booking.provider_id == key.provider_id
                        && booking.date == key.date
                        && booking.slot_id == slot_id
                });
            if let Some(existing) =
                latest.filter(|booking| booking.customer_id == new_booking.customer_id)
            {
                debug!("Slot {} already booked by this customer, returning booking {}", slot_id, existing.id);
                return Ok((existing.clone(), document.clone()));
            }
        }

        apply_transition(
            slot,
            &SlotTransition::Book {
                source: BookingSource::OnlineBooking,
            },
        )?;
        let booking = new_booking.into_booking(Uuid::new_v4(), Utc::now());
        state.bookings.push(booking.clone());
        self.commit(document);
        Ok((booking, document.clone()))
    }

    async fn list_bookings(&self, provider_id: Uuid) -> SlotResult<Vec<Booking>> {
        self.round_trip().await;
        let state = self.state.read().await;
        // Newest first, like the SQL store
        Ok(state
            .bookings
            .iter()
            .rev()
            .filter(|booking| booking.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn create_notification(&self, notification: NewNotification) -> SlotResult<Notification> {
        self.round_trip().await;
        let notification = notification.into_notification(Uuid::new_v4(), Utc::now());
        self.state
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&self, provider_id: Uuid) -> SlotResult<Vec<Notification>> {
        self.round_trip().await;
        let state = self.state.read().await;
        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|notification| notification.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, provider_id: Uuid, notification_id: Uuid) -> SlotResult<Notification> {
        self.round_trip().await;
        let mut state = self.state.write().await;
        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.provider_id == provider_id)
            .ok_or_else(|| {
                SlotError::NotFound(format!("Notification with ID {} not found", notification_id))
            })?;
        notification.read = true;
        Ok(notification.clone())
    }
}

#[async_trait]
impl ProviderStore for InMemoryStore {
    async fn create_provider(&self, name: String, password_hash: Option<String>) -> SlotResult<Provider> {
        self.round_trip().await;
        let provider = Provider {
            id: Uuid::new_v4(),
            name,
            password_hash,
            created_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .providers
            .insert(provider.id, provider.clone());
        Ok(provider)
    }

    async fn get_provider(&self, id: Uuid) -> SlotResult<Option<Provider>> {
        self.round_trip().await;
        Ok(self.state.read().await.providers.get(&id).cloned())
    }
}
