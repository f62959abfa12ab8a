//! # Booking Applier
//!
//! Status changes for a single slot. Stores call [`apply_transition`] while
//! holding whatever lock makes the read and the write of that slot atomic, so
//! the precondition checked here is the one that gets committed.

use serde::{Deserialize, Serialize};

use crate::errors::{SlotError, SlotResult};
use crate::models::slot::{BookingSource, Slot, SlotStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SlotTransition {
    /// `available -> busy`
    MarkBusy,
    /// `available -> booked`
    Book { source: BookingSource },
    /// `busy | booked -> available`
    Release,
}

impl SlotTransition {
    pub fn name(&self) -> &'static str {
        match self {
            SlotTransition::MarkBusy => "mark_busy",
            SlotTransition::Book { .. } => "book",
            SlotTransition::Release => "release",
        }
    }
}

/// Applies `transition` to `slot` in place.
///
/// Returns `Ok(true)` if the slot changed, `Ok(false)` for the one no-op
/// (releasing a slot that is already available).
///
/// # Errors
///
/// * `SlotError::SlotNotAvailable` - booking or marking busy a slot that is
///   not `available`; the slot is left untouched
pub fn apply_transition(slot: &mut Slot, transition: &SlotTransition) -> SlotResult<bool> {
    match transition {
        SlotTransition::MarkBusy => {
            if !slot.status.is_available() {
                return Err(SlotError::not_available(slot.id, &slot.status));
            }
            slot.status = SlotStatus::Busy;
            Ok(true)
        }
        SlotTransition::Book { source } => {
            if !slot.status.is_available() {
                return Err(SlotError::not_available(slot.id, &slot.status));
            }
            slot.status = SlotStatus::Booked {
                source: source.clone(),
            };
            Ok(true)
        }
        SlotTransition::Release => {
            if slot.status.is_available() {
                return Ok(false);
            }
            slot.status = SlotStatus::Available;
            Ok(true)
        }
    }
}
