use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use slotbook_core::errors::SlotError;
use slotbook_core::models::availability::AvailabilityDocument;
use slotbook_core::models::booking::{Booking, BookingStatus, Notification, NotificationKind};
use slotbook_core::models::provider::Provider;
use slotbook_core::models::slot::{Slot, SlotId, SlotStatus};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbProvider {
    pub id: Uuid,
    pub name: String,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbProvider> for Provider {
    fn from(row: DbProvider) -> Self {
        Provider {
            id: row.id,
            name: row.name,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailability {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl DbAvailability {
    pub fn into_document(self, slots: Vec<DbSlot>) -> Result<AvailabilityDocument, SlotError> {
        Ok(AvailabilityDocument {
            provider_id: self.provider_id,
            date: self.date,
            slots: slots
                .into_iter()
                .map(Slot::try_from)
                .collect::<Result<_, _>>()?,
            updated_at: self.updated_at,
            version: self.version,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSlot {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub position: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub source: Option<String>,
}

impl TryFrom<DbSlot> for Slot {
    type Error = SlotError;

    fn try_from(row: DbSlot) -> Result<Self, Self::Error> {
        Ok(Slot {
            id: SlotId(row.id),
            start: row.start_time,
            end: row.end_time,
            status: SlotStatus::from_parts(&row.status, row.source.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub customer_id: String,
    pub customer_name: String,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub date: NaiveDate,
    pub slot_id: Uuid,
    pub slot_start: NaiveTime,
    pub slot_end: NaiveTime,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbBooking> for Booking {
    type Error = SlotError;

    fn try_from(row: DbBooking) -> Result<Self, Self::Error> {
        let status = BookingStatus::parse(&row.status)
            .ok_or_else(|| SlotError::Validation(format!("Unknown booking status '{}'", row.status)))?;
        Ok(Booking {
            id: row.id,
            provider_id: row.provider_id,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            service_id: row.service_id,
            service_name: row.service_name,
            date: row.date,
            slot_id: SlotId(row.slot_id),
            slot_start: row.slot_start,
            slot_end: row.slot_end,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbNotification {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub kind: String,
    pub message: String,
    pub customer_name: String,
    pub service_name: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbNotification> for Notification {
    type Error = SlotError;

    fn try_from(row: DbNotification) -> Result<Self, Self::Error> {
        let kind = NotificationKind::parse(&row.kind)
            .ok_or_else(|| SlotError::Validation(format!("Unknown notification kind '{}'", row.kind)))?;
        Ok(Notification {
            id: row.id,
            provider_id: row.provider_id,
            kind,
            message: row.message,
            customer_name: row.customer_name,
            service_name: row.service_name,
            date: row.date,
            time: row.time,
            read: row.read,
            created_at: row.created_at,
        })
    }
}
