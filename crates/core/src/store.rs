//! # Store Contracts
//!
//! Persistence traits the availability service depends on, plus the
//! in-process change feed that backs live subscriptions. `slotbook-db`
//! provides the PostgreSQL and in-memory implementations.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::errors::SlotResult;
use crate::models::availability::{AvailabilityDocument, AvailabilityKey};
use crate::models::booking::{Booking, NewBooking, NewNotification, Notification};
use crate::models::provider::Provider;
use crate::models::slot::{Slot, SlotId};
use crate::transition::SlotTransition;

#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn get_availability(&self, key: AvailabilityKey) -> SlotResult<Option<AvailabilityDocument>>;

    /// Replaces the whole document, creating it on first save.
    ///
    /// With `expected_version` set the write is rejected with
    /// `SlotError::VersionConflict` unless the stored version matches (0 for a
    /// document that does not exist yet). Without it, last writer wins.
    async fn set_availability(
        &self,
        key: AvailabilityKey,
        slots: Vec<Slot>,
        expected_version: Option<i64>,
    ) -> SlotResult<AvailabilityDocument>;

    /// Atomically applies `transition` to one slot. The precondition check and
    /// the write happen under the same lock, so two racing bookings of the
    /// same slot cannot both succeed.
    async fn transition_slot(
        &self,
        key: AvailabilityKey,
        slot_id: SlotId,
        transition: SlotTransition,
    ) -> SlotResult<AvailabilityDocument>;

    async fn remove_slot(&self, key: AvailabilityKey, slot_id: SlotId) -> SlotResult<AvailabilityDocument>;

    /// Live updates for one document. Dropping the subscription unsubscribes.
    fn subscribe_availability(&self, key: AvailabilityKey) -> AvailabilitySubscription;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Claims an available slot for an online booking and records the
    /// booking in one atomic write: either both are stored or neither is.
    ///
    /// A slot that is already booked online by this customer returns the
    /// stored booking unchanged, so retrying after an unknown outcome (a
    /// timeout) cannot book twice. Any other taken slot is
    /// `SlotError::SlotNotAvailable`.
    async fn book_slot(&self, key: AvailabilityKey, booking: NewBooking) -> SlotResult<(Booking, AvailabilityDocument)>;

    async fn list_bookings(&self, provider_id: Uuid) -> SlotResult<Vec<Booking>>;

    async fn create_notification(&self, notification: NewNotification) -> SlotResult<Notification>;

    async fn list_notifications(&self, provider_id: Uuid) -> SlotResult<Vec<Notification>>;

    async fn mark_notification_read(&self, provider_id: Uuid, notification_id: Uuid) -> SlotResult<Notification>;
}

#[async_trait]
pub trait ProviderStore: Send + Sync {
    async fn create_provider(&self, name: String, password_hash: Option<String>) -> SlotResult<Provider>;

    async fn get_provider(&self, id: Uuid) -> SlotResult<Option<Provider>>;
}

/// Everything the service needs from one backend.
pub trait MarketStore: AvailabilityStore + BookingStore + ProviderStore {}

impl<T> MarketStore for T where T: AvailabilityStore + BookingStore + ProviderStore {}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityChange {
    pub key: AvailabilityKey,
    pub document: AvailabilityDocument,
}

/// Fan-out of committed availability writes to live subscribers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<AvailabilityChange>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, document: &AvailabilityDocument) {
        let change = AvailabilityChange {
            key: document.key(),
            document: document.clone(),
        };
        // No receivers is the common case and not an error.
        let receivers = self.sender.send(change).unwrap_or(0);
        tracing::trace!("Published {} to {} subscribers", document.key(), receivers);
    }

    pub fn subscribe(&self, key: AvailabilityKey) -> AvailabilitySubscription {
        AvailabilitySubscription {
            key,
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(64)
    }
}

#[derive(Debug)]
pub struct AvailabilitySubscription {
    key: AvailabilityKey,
    receiver: broadcast::Receiver<AvailabilityChange>,
}

impl AvailabilitySubscription {
    pub fn key(&self) -> AvailabilityKey {
        self.key
    }

    /// Waits for the next write to this subscription's document. Returns
    /// `None` once the feed is gone.
    ///
    /// A subscriber that falls behind the feed's buffer skips the missed
    /// writes. Every document carries its `version`, so consumers can tell
    /// how far they jumped.
    pub async fn next(&mut self) -> Option<AvailabilityDocument> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.key == self.key => return Some(change.document),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Subscriber for {} lagged, skipped {} changes", self.key, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
