//! # Availability Service
//!
//! Business rules on top of a [`MarketStore`]: who may change a provider's
//! day, which transitions each side may request, and the customer booking
//! flow (claim the slot together with the booking record, then notify the
//! provider).
//!
//! Every store call is bounded by a timeout so a hung backend surfaces as a
//! retryable `StoreUnavailable` instead of a request that never finishes.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{SlotError, SlotResult};
use crate::generator::generate_slots;
use crate::models::availability::{AvailabilityDocument, AvailabilityKey, GenerateSlotsRequest};
use crate::models::booking::{Booking, NewBooking, NewNotification, Notification};
use crate::models::provider::Provider;
use crate::models::slot::{BookingSource, Slot, SlotId};
use crate::session::Session;
use crate::store::{AvailabilitySubscription, MarketStore};
use crate::transition::SlotTransition;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// How a customer picked the slot to book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotSelector {
    Id(SlotId),
    Label(String),
}

impl SlotSelector {
    pub fn from_request(slot_id: Option<SlotId>, label: Option<&str>) -> SlotResult<Self> {
        match (slot_id, label.map(str::trim).filter(|l| !l.is_empty())) {
            (Some(id), _) => Ok(SlotSelector::Id(id)),
            (None, Some(label)) => Ok(SlotSelector::Label(label.to_string())),
            (None, None) => Err(SlotError::Validation(
                "Please select a time slot".to_string(),
            )),
        }
    }
}

/// The service offering a booking is made for, if the caller knows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn MarketStore>,
    store_timeout: Duration,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn MarketStore>, store_timeout: Duration) -> Self {
        Self { store, store_timeout }
    }

    pub fn generate(&self, request: &GenerateSlotsRequest) -> SlotResult<Vec<Slot>> {
        generate_slots(request.start_time, request.end_time, request.duration_minutes)
    }

    pub async fn find(&self, key: AvailabilityKey) -> SlotResult<Option<AvailabilityDocument>> {
        self.bounded("get_availability", self.store.get_availability(key))
            .await
    }

    pub async fn get(&self, key: AvailabilityKey) -> SlotResult<AvailabilityDocument> {
        self.find(key).await?.ok_or_else(|| {
            SlotError::NotFound(format!("No availability set for {}", key))
        })
    }

    /// Slots a customer can still book, or `None` for a day that was never
    /// saved.
    pub async fn open_slots(&self, key: AvailabilityKey) -> SlotResult<Option<Vec<Slot>>> {
        Ok(self
            .find(key)
            .await?
            .map(|doc| doc.open_slots().cloned().collect()))
    }

    pub async fn save(
        &self,
        session: &Session,
        key: AvailabilityKey,
        slots: Vec<Slot>,
        expected_version: Option<i64>,
    ) -> SlotResult<AvailabilityDocument> {
        session.require_provider(key.provider_id)?;
        validate_slots(&slots)?;
        self.check_online_bookings(key, &slots).await?;

        let document = self
            .bounded(
                "set_availability",
                self.store.set_availability(key, slots, expected_version),
            )
            .await?;

        info!(
            "Saved availability {} (version {}, {} slots)",
            key,
            document.version,
            document.slots.len()
        );
        Ok(document)
    }

    /// Provider-side status change on one slot.
    ///
    /// Releasing a busy or booked slot must be `confirmed`, and the
    /// `online-booking` source is reserved for [`AvailabilityService::book`].
    pub async fn set_slot_status(
        &self,
        session: &Session,
        key: AvailabilityKey,
        slot_id: SlotId,
        transition: SlotTransition,
        confirmed: bool,
    ) -> SlotResult<AvailabilityDocument> {
        session.require_provider(key.provider_id)?;

        match &transition {
            SlotTransition::Release if !confirmed => {
                return Err(SlotError::Validation(
                    "Marking a slot as available again must be confirmed".to_string(),
                ));
            }
            SlotTransition::Book {
                source: BookingSource::OnlineBooking,
            } => {
                return Err(SlotError::Validation(
                    "The online-booking source is set by customer bookings only".to_string(),
                ));
            }
            _ => {}
        }

        let action = transition.name();
        let document = self
            .bounded(
                "transition_slot",
                self.store.transition_slot(key, slot_id, transition),
            )
            .await?;

        debug!("Applied {} to slot {} in {}", action, slot_id, key);
        Ok(document)
    }

    pub async fn delete_slot(
        &self,
        session: &Session,
        key: AvailabilityKey,
        slot_id: SlotId,
    ) -> SlotResult<AvailabilityDocument> {
        session.require_provider(key.provider_id)?;
        self.bounded("remove_slot", self.store.remove_slot(key, slot_id))
            .await
    }

    /// Customer self-service booking.
    ///
    /// The store claims the slot and records the booking in one atomic
    /// write; losing the race yields `SlotNotAvailable`. A timeout leaves the
    /// outcome unknown and is returned as a retryable `StoreUnavailable`: the
    /// same customer retrying gets the stored booking back. A failed provider
    /// notification is logged and does not fail the booking.
    pub async fn book(
        &self,
        session: &Session,
        key: AvailabilityKey,
        selector: SlotSelector,
        service: ServiceRef,
    ) -> SlotResult<(Booking, AvailabilityDocument)> {
        let Session::Customer { customer_id, name } = session else {
            return Err(SlotError::Authorization(
                "Only customers can book online".to_string(),
            ));
        };

        let current = self.get(key).await?;
        let slot = match &selector {
            SlotSelector::Id(id) => current.find_slot(*id),
            SlotSelector::Label(label) => current.find_slot_by_label(label),
        }
        .cloned()
        .ok_or_else(|| SlotError::SlotNotFound(describe(&selector, key)))?;

        let new_booking = NewBooking {
            provider_id: key.provider_id,
            customer_id: customer_id.clone(),
            customer_name: name.clone(),
            service_id: service.id,
            service_name: service.name,
            date: key.date,
            slot_id: slot.id,
            slot_start: slot.start,
            slot_end: slot.end,
        };

        let (booking, document) = self
            .bounded("book_slot", self.store.book_slot(key, new_booking))
            .await?;

        let notification = NewNotification::new_booking(&booking, slot.label());
        if let Err(err) = self
            .bounded("create_notification", self.store.create_notification(notification))
            .await
        {
            warn!("Booking {} saved but provider notification failed: {}", booking.id, err);
        }

        info!(
            "Customer {} booked {} on {} (booking {})",
            booking.customer_id,
            slot.label(),
            key,
            booking.id
        );
        Ok((booking, document))
    }

    pub async fn bookings(&self, session: &Session, provider_id: Uuid) -> SlotResult<Vec<Booking>> {
        session.require_provider(provider_id)?;
        self.bounded("list_bookings", self.store.list_bookings(provider_id))
            .await
    }

    pub async fn notifications(&self, session: &Session, provider_id: Uuid) -> SlotResult<Vec<Notification>> {
        session.require_provider(provider_id)?;
        self.bounded("list_notifications", self.store.list_notifications(provider_id))
            .await
    }

    pub async fn mark_notification_read(
        &self,
        session: &Session,
        provider_id: Uuid,
        notification_id: Uuid,
    ) -> SlotResult<Notification> {
        session.require_provider(provider_id)?;
        self.bounded(
            "mark_notification_read",
            self.store.mark_notification_read(provider_id, notification_id),
        )
        .await
    }

    pub async fn register_provider(&self, name: &str, password_hash: Option<String>) -> SlotResult<Provider> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SlotError::Validation("Provider name is required".to_string()));
        }
        self.bounded(
            "create_provider",
            self.store.create_provider(name.to_string(), password_hash),
        )
        .await
    }

    pub async fn provider(&self, id: Uuid) -> SlotResult<Provider> {
        self.bounded("get_provider", self.store.get_provider(id))
            .await?
            .ok_or_else(|| SlotError::NotFound(format!("Provider with ID {} not found", id)))
    }

    /// Providers may keep customer bookings when saving a whole day, but not
    /// create them: a slot saved as booked online must already be stored that
    /// way.
    async fn check_online_bookings(&self, key: AvailabilityKey, slots: &[Slot]) -> SlotResult<()> {
        let online: Vec<&Slot> = slots
            .iter()
            .filter(|slot| is_booked_online(slot))
            .collect();
        if online.is_empty() {
            return Ok(());
        }

        let current = self.find(key).await?;
        for slot in online {
            let stored = current.as_ref().and_then(|doc| doc.find_slot(slot.id));
            if !stored.is_some_and(is_booked_online) {
                return Err(SlotError::Validation(format!(
                    "Slot {} ({}) cannot be marked as booked online by the provider",
                    slot.id,
                    slot.label()
                )));
            }
        }
        Ok(())
    }

    pub fn subscribe(&self, key: AvailabilityKey) -> AvailabilitySubscription {
        self.store.subscribe_availability(key)
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> SlotResult<T>
    where
        F: Future<Output = SlotResult<T>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Store call {} timed out after {:?}", operation, self.store_timeout);
                Err(SlotError::StoreUnavailable(eyre::eyre!(
                    "{} timed out after {:?}",
                    operation,
                    self.store_timeout
                )))
            }
        }
    }
}

fn is_booked_online(slot: &Slot) -> bool {
    matches!(
        slot.status.source(),
        Some(BookingSource::OnlineBooking)
    )
}

fn describe(selector: &SlotSelector, key: AvailabilityKey) -> String {
    match selector {
        SlotSelector::Id(id) => format!("slot {} in {}", id, key),
        SlotSelector::Label(label) => format!("slot '{}' in {}", label, key),
    }
}

/// Slots must have positive length and distinct ids; ids key every per-slot
/// update. Overlapping or repeated time ranges are allowed.
fn validate_slots(slots: &[Slot]) -> SlotResult<()> {
    let mut seen = HashSet::with_capacity(slots.len());
    for slot in slots {
        if slot.start >= slot.end {
            return Err(SlotError::Validation(format!(
                "Slot {} must end after it starts ({})",
                slot.id,
                slot.label()
            )));
        }
        if !seen.insert(slot.id) {
            return Err(SlotError::Validation(format!("Duplicate slot id {}", slot.id)));
        }
    }
    Ok(())
}
