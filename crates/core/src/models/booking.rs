use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::slot::{clock, SlotId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub customer_id: String,
    pub customer_name: String,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub date: NaiveDate,
    pub slot_id: SlotId,
    #[serde(with = "clock")]
    pub slot_start: chrono::NaiveTime,
    #[serde(with = "clock")]
    pub slot_end: chrono::NaiveTime,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub provider_id: Uuid,
    pub customer_id: String,
    pub customer_name: String,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub date: NaiveDate,
    pub slot_id: SlotId,
    pub slot_start: chrono::NaiveTime,
    pub slot_end: chrono::NaiveTime,
}

impl NewBooking {
    pub fn into_booking(self, id: Uuid, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id,
            provider_id: self.provider_id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            service_id: self.service_id,
            service_name: self.service_name,
            date: self.date,
            slot_id: self.slot_id,
            slot_start: self.slot_start,
            slot_end: self.slot_end,
            status: BookingStatus::Confirmed,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewBooking,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewBooking => "new_booking",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "new_booking" => Some(NotificationKind::NewBooking),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub customer_name: String,
    pub service_name: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub provider_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub customer_name: String,
    pub service_name: Option<String>,
    pub date: NaiveDate,
    pub time: String,
}

impl NewNotification {
    pub fn new_booking(booking: &Booking, label: String) -> Self {
        Self {
            provider_id: booking.provider_id,
            kind: NotificationKind::NewBooking,
            message: format!("New booking from {}", booking.customer_name),
            customer_name: booking.customer_name.clone(),
            service_name: booking.service_name.clone(),
            date: booking.date,
            time: label,
        }
    }

    pub fn into_notification(self, id: Uuid, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id,
            provider_id: self.provider_id,
            kind: self.kind,
            message: self.message,
            customer_name: self.customer_name,
            service_name: self.service_name,
            date: self.date,
            time: self.time,
            read: false,
            created_at,
        }
    }
}

/// Customer self-service booking. Either `slot_id` or `time` (the slot label,
/// e.g. `09:00 AM - 10:00 AM`) selects the slot; `slot_id` wins if both are
/// present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub customer_id: String,
    pub customer_name: String,
    pub slot_id: Option<SlotId>,
    pub time: Option<String>,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotResponse {
    pub booking: Booking,
    pub availability_version: i64,
}
