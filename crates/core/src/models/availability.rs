use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::SlotError;
use crate::models::slot::{clock, Slot, SlotId};
use crate::transition::SlotTransition;

/// Identifies one provider's availability for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvailabilityKey {
    pub provider_id: Uuid,
    pub date: NaiveDate,
}

impl AvailabilityKey {
    pub fn new(provider_id: Uuid, date: NaiveDate) -> Self {
        Self { provider_id, date }
    }

    /// Document path, `providers/{providerId}/availability/{YYYY-MM-DD}`.
    pub fn path(&self) -> String {
        format!(
            "providers/{}/availability/{}",
            self.provider_id,
            self.date.format("%Y-%m-%d")
        )
    }

    pub fn from_path(path: &str) -> Result<Self, SlotError> {
        let invalid = || SlotError::Validation(format!("Invalid availability path '{path}'"));
        let mut parts = path.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("providers"), Some(provider_id), Some("availability"), Some(date), None) => {
                let provider_id = Uuid::parse_str(provider_id).map_err(|_| invalid())?;
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?;
                Ok(Self::new(provider_id, date))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for AvailabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityDocument {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl AvailabilityDocument {
    pub fn key(&self) -> AvailabilityKey {
        AvailabilityKey::new(self.provider_id, self.date)
    }

    pub fn find_slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    pub fn find_slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }

    /// Looks a slot up by the label a customer picked. Both sides are
    /// normalised so `9:00 am - 10:00 am` matches `09:00 AM - 10:00 AM`.
    /// Ranges may repeat within a day; an available match is preferred.
    pub fn find_slot_by_label(&self, label: &str) -> Option<&Slot> {
        let (start, end) = parse_label(label)?;
        let mut matches = self
            .slots
            .iter()
            .filter(|slot| slot.start == start && slot.end == end)
            .peekable();
        let first = *matches.peek()?;
        Some(matches.find(|slot| slot.status.is_available()).unwrap_or(first))
    }

    pub fn open_slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|slot| slot.status.is_available())
    }
}

fn parse_label(label: &str) -> Option<(chrono::NaiveTime, chrono::NaiveTime)> {
    let (start, end) = label.split_once(" - ")?;
    Some((clock::parse(start).ok()?, clock::parse(end).ok()?))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSlotsRequest {
    #[serde(with = "clock")]
    pub start_time: chrono::NaiveTime,
    #[serde(with = "clock")]
    pub end_time: chrono::NaiveTime,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSlotsResponse {
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAvailabilityRequest {
    pub slots: Vec<Slot>,
    /// When set, the save only succeeds if the stored document still has this
    /// version. Zero means "no document saved yet".
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSlotsResponse {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    /// False when the provider never saved this day, so an empty `slots`
    /// means "no availability set" rather than "everything is taken".
    pub availability_set: bool,
    pub slots: Vec<OpenSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSlot {
    pub id: SlotId,
    pub label: String,
    #[serde(with = "clock")]
    pub start: chrono::NaiveTime,
    #[serde(with = "clock")]
    pub end: chrono::NaiveTime,
}

impl From<&Slot> for OpenSlot {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id,
            label: slot.label(),
            start: slot.start,
            end: slot.end,
        }
    }
}

/// Provider-side change to one slot, e.g. `{"action": "book", "source":
/// "whatsapp"}` or `{"action": "release", "confirm": true}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotStatusRequest {
    #[serde(flatten)]
    pub transition: SlotTransition,
    #[serde(default)]
    pub confirm: bool,
}
