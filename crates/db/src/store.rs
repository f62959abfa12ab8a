//! # PostgreSQL Store
//!
//! Implements the store contracts on top of the repositories. Every write to
//! an availability document runs in one transaction that first locks the
//! document row, so per-slot transitions are serialised with whole-document
//! saves and with each other.

use async_trait::async_trait;
use eyre::WrapErr;
use slotbook_core::errors::{SlotError, SlotResult};
use slotbook_core::models::availability::{AvailabilityDocument, AvailabilityKey};
use slotbook_core::models::booking::{Booking, NewBooking, NewNotification, Notification};
use slotbook_core::models::provider::Provider;
use slotbook_core::models::slot::{BookingSource, Slot, SlotId, SlotStatus};
use slotbook_core::store::{
    AvailabilityStore, AvailabilitySubscription, BookingStore, ChangeFeed, ProviderStore,
};
use slotbook_core::transition::{apply_transition, SlotTransition};
use sqlx::postgres::PgListener;
use sqlx::{PgConnection, PgPool};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::repositories::{availability, booking, provider};

pub struct PgStore {
    pool: PgPool,
    feed: ChangeFeed,
    /// Tags our own change notifications so the listener can skip them.
    origin: Uuid,
}

impl PgStore {
    pub fn new(pool: PgPool, feed: ChangeFeed) -> Self {
        Self {
            pool,
            feed,
            origin: Uuid::new_v4(),
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn change_payload(&self, key: AvailabilityKey) -> String {
        format!("{} {}", self.origin, key.path())
    }

    /// Forwards availability changes committed by other processes into this
    /// process' change feed.
    pub fn spawn_listener(&self) -> JoinHandle<()> {
        let pool = self.pool.clone();
        let feed = self.feed.clone();
        let origin = self.origin.to_string();

        tokio::spawn(async move {
            if let Err(err) = listen_for_changes(pool, feed, origin).await {
                error!("Availability change listener stopped: {:?}", err);
            }
        })
    }
}

async fn listen_for_changes(pool: PgPool, feed: ChangeFeed, origin: String) -> eyre::Result<()> {
    let mut listener = PgListener::connect_with(&pool).await?;
    listener.listen(availability::CHANGE_CHANNEL).await?;
    info!("Listening for availability changes on '{}'", availability::CHANGE_CHANNEL);

    loop {
        let notification = listener.recv().await?;
        let Some((sender, path)) = notification.payload().split_once(' ') else {
            warn!("Ignoring malformed change notification '{}'", notification.payload());
            continue;
        };
        if sender == origin {
            continue;
        }

        let key = match AvailabilityKey::from_path(path) {
            Ok(key) => key,
            Err(err) => {
                warn!("Ignoring change notification: {}", err);
                continue;
            }
        };

        let mut conn = pool.acquire().await?;
        match load_document(&mut conn, key).await {
            Ok(Some(document)) => feed.publish(&document),
            Ok(None) => debug!("Change notification for missing document {}", key),
            Err(err) => warn!("Could not reload {} after change notification: {}", key, err),
        }
    }
}

async fn load_document(conn: &mut PgConnection, key: AvailabilityKey) -> SlotResult<Option<AvailabilityDocument>> {
    let Some(header) = availability::get_availability(conn, key.provider_id, key.date).await? else {
        return Ok(None);
    };
    let slots = availability::get_slots(conn, key.provider_id, key.date).await?;
    Ok(Some(header.into_document(slots)?))
}

fn not_saved(key: AvailabilityKey) -> SlotError {
    SlotError::NotFound(format!("No availability set for {}", key))
}

fn slot_missing(key: AvailabilityKey, slot_id: SlotId) -> SlotError {
    SlotError::SlotNotFound(format!("slot {} in {}", slot_id, key))
}

fn check_version(expected: Option<i64>, actual: i64) -> SlotResult<()> {
    match expected {
        Some(expected) if expected != actual => Err(SlotError::VersionConflict { expected, actual }),
        _ => Ok(()),
    }
}

#[async_trait]
impl AvailabilityStore for PgStore {
    async fn get_availability(&self, key: AvailabilityKey) -> SlotResult<Option<AvailabilityDocument>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .wrap_err("Failed to acquire database connection")?;
        load_document(&mut conn, key).await
    }

    async fn set_availability(
        &self,
        key: AvailabilityKey,
        slots: Vec<Slot>,
        expected_version: Option<i64>,
    ) -> SlotResult<AvailabilityDocument> {
        let mut tx = self.pool.begin().await.wrap_err("Failed to begin transaction")?;

        // FOR UPDATE locks nothing while the row is missing, so a first save
        // claims the row with an insert that loses to any concurrent one.
        let header = match availability::lock_availability(&mut tx, key.provider_id, key.date).await? {
            Some(current) => {
                check_version(expected_version, current.version)?;
                availability::upsert_availability(&mut tx, key.provider_id, key.date).await?
            }
            None => {
                check_version(expected_version, 0)?;
                match availability::insert_availability(&mut tx, key.provider_id, key.date).await? {
                    Some(created) => created,
                    None => {
                        let current = availability::lock_availability(&mut tx, key.provider_id, key.date)
                            .await?
                            .ok_or_else(|| not_saved(key))?;
                        check_version(expected_version, current.version)?;
                        availability::upsert_availability(&mut tx, key.provider_id, key.date).await?
                    }
                }
            }
        };
        availability::delete_slots(&mut tx, key.provider_id, key.date).await?;
        for (position, slot) in slots.iter().enumerate() {
            let position = i32::try_from(position).wrap_err("Too many slots in one day")?;
            availability::insert_slot(&mut tx, key.provider_id, key.date, position, slot).await?;
        }
        availability::notify_change(&mut tx, &self.change_payload(key)).await?;
        tx.commit().await.wrap_err("Failed to commit availability")?;

        let document = AvailabilityDocument {
            provider_id: key.provider_id,
            date: key.date,
            slots,
            updated_at: header.updated_at,
            version: header.version,
        };
        self.feed.publish(&document);
        Ok(document)
    }

    async fn transition_slot(
        &self,
        key: AvailabilityKey,
        slot_id: SlotId,
        transition: SlotTransition,
    ) -> SlotResult<AvailabilityDocument> {
        let mut tx = self.pool.begin().await.wrap_err("Failed to begin transaction")?;

        availability::lock_availability(&mut tx, key.provider_id, key.date)
            .await?
            .ok_or_else(|| not_saved(key))?;
        let row = availability::lock_slot(&mut tx, key.provider_id, key.date, slot_id.0)
            .await?
            .ok_or_else(|| slot_missing(key, slot_id))?;

        let mut slot = Slot::try_from(row)?;
        if !apply_transition(&mut slot, &transition)? {
            // Nothing to write; the transaction rolls back on drop.
            return load_document(&mut tx, key).await?.ok_or_else(|| not_saved(key));
        }

        availability::update_slot_status(&mut tx, key.provider_id, key.date, &slot).await?;
        availability::upsert_availability(&mut tx, key.provider_id, key.date).await?;
        availability::notify_change(&mut tx, &self.change_payload(key)).await?;
        let document = load_document(&mut tx, key).await?.ok_or_else(|| not_saved(key))?;
        tx.commit().await.wrap_err("Failed to commit slot transition")?;

        self.feed.publish(&document);
        Ok(document)
    }

    async fn remove_slot(&self, key: AvailabilityKey, slot_id: SlotId) -> SlotResult<AvailabilityDocument> {
        let mut tx = self.pool.begin().await.wrap_err("Failed to begin transaction")?;

        availability::lock_availability(&mut tx, key.provider_id, key.date)
            .await?
            .ok_or_else(|| not_saved(key))?;
        availability::lock_slot(&mut tx, key.provider_id, key.date, slot_id.0)
            .await?
            .ok_or_else(|| slot_missing(key, slot_id))?;

        availability::delete_slot(&mut tx, key.provider_id, key.date, slot_id.0).await?;
        availability::upsert_availability(&mut tx, key.provider_id, key.date).await?;
        availability::notify_change(&mut tx, &self.change_payload(key)).await?;
        let document = load_document(&mut tx, key).await?.ok_or_else(|| not_saved(key))?;
        tx.commit().await.wrap_err("Failed to commit slot removal")?;

        self.feed.publish(&document);
        Ok(document)
    }

    fn subscribe_availability(&self, key: AvailabilityKey) -> AvailabilitySubscription {
        self.feed.subscribe(key)
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn book_slot(&self, key: AvailabilityKey, new_booking: NewBooking) -> SlotResult<(Booking, AvailabilityDocument)> {
        let mut tx = self.pool.begin().await.wrap_err("Failed to begin transaction")?;

        availability::lock_availability(&mut tx, key.provider_id, key.date)
            .await?
            .ok_or_else(|| not_saved(key))?;
        let row = availability::lock_slot(&mut tx, key.provider_id, key.date, new_booking.slot_id.0)
            .await?
            .ok_or_else(|| slot_missing(key, new_booking.slot_id))?;
        let mut slot = Slot::try_from(row)?;

        let online = SlotStatus::Booked {
            source: BookingSource::OnlineBooking,
        };
        if slot.status == online {
            let latest = booking::latest_confirmed_booking(&mut tx, key.provider_id, key.date, slot.id.0).await?;
            if let Some(existing) = latest.filter(|row| row.customer_id == new_booking.customer_id) {
                debug!("Slot {} already booked by this customer, returning booking {}", slot.id, existing.id);
                let document = load_document(&mut tx, key).await?.ok_or_else(|| not_saved(key))?;
                return Ok((Booking::try_from(existing)?, document));
            }
        }

        apply_transition(
            &mut slot,
            &SlotTransition::Book {
                source: BookingSource::OnlineBooking,
            },
        )?;
        availability::update_slot_status(&mut tx, key.provider_id, key.date, &slot).await?;
        availability::upsert_availability(&mut tx, key.provider_id, key.date).await?;
        let booking = Booking::try_from(booking::create_booking(&mut tx, &new_booking).await?)?;
        availability::notify_change(&mut tx, &self.change_payload(key)).await?;
        let document = load_document(&mut tx, key).await?.ok_or_else(|| not_saved(key))?;
        tx.commit().await.wrap_err("Failed to commit booking")?;

        self.feed.publish(&document);
        Ok((booking, document))
    }

    async fn list_bookings(&self, provider_id: Uuid) -> SlotResult<Vec<Booking>> {
        booking::get_bookings_by_provider_id(&self.pool, provider_id)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn create_notification(&self, notification: NewNotification) -> SlotResult<Notification> {
        let row = booking::create_notification(&self.pool, &notification).await?;
        Notification::try_from(row)
    }

    async fn list_notifications(&self, provider_id: Uuid) -> SlotResult<Vec<Notification>> {
        booking::get_notifications_by_provider_id(&self.pool, provider_id)
            .await?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }

    async fn mark_notification_read(&self, provider_id: Uuid, notification_id: Uuid) -> SlotResult<Notification> {
        let row = booking::mark_notification_read(&self.pool, provider_id, notification_id)
            .await?
            .ok_or_else(|| {
                SlotError::NotFound(format!("Notification with ID {} not found", notification_id))
            })?;
        Notification::try_from(row)
    }
}

#[async_trait]
impl ProviderStore for PgStore {
    async fn create_provider(&self, name: String, password_hash: Option<String>) -> SlotResult<Provider> {
        let row = provider::create_provider(&self.pool, &name, password_hash.as_deref()).await?;
        Ok(row.into())
    }

    async fn get_provider(&self, id: Uuid) -> SlotResult<Option<Provider>> {
        let row = provider::get_provider_by_id(&self.pool, id).await?;
        Ok(row.map(Provider::from))
    }
}
