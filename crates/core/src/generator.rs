//! # Slot Generator
//!
//! Splits a working window into back-to-back slots of a fixed length. The
//! result is a fresh list; merging with anything already saved is the
//! caller's business (saving replaces the whole day anyway).

use chrono::{Duration, NaiveTime};

use crate::errors::{SlotError, SlotResult};
use crate::models::slot::{clock, Slot};

/// Longest slot a provider can generate (12 hours).
pub const MAX_SLOT_MINUTES: i64 = 720;

/// Generates contiguous `available` slots of `duration_minutes` each, starting
/// at `start` and ending at or before `end`.
///
/// A trailing remainder shorter than one slot is dropped. Generation never
/// wraps past midnight.
///
/// # Errors
///
/// * `SlotError::InvalidGenerationRange` - `start >= end`, or the duration is
///   not in `1..=MAX_SLOT_MINUTES`
///
/// # Example
///
/// ```
/// use chrono::NaiveTime;
/// use slotbook_core::generator::generate_slots;
///
/// let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
/// let end = NaiveTime::from_hms_opt(11, 0, 0).unwrap();
/// let slots = generate_slots(start, end, 60).unwrap();
/// assert_eq!(slots.len(), 2);
/// assert_eq!(slots[1].label(), "10:00 AM - 11:00 AM");
/// ```
pub fn generate_slots(start: NaiveTime, end: NaiveTime, duration_minutes: i64) -> SlotResult<Vec<Slot>> {
    if duration_minutes <= 0 || duration_minutes > MAX_SLOT_MINUTES {
        return Err(SlotError::InvalidGenerationRange(format!(
            "duration must be between 1 and {MAX_SLOT_MINUTES} minutes, got {duration_minutes}"
        )));
    }
    if start >= end {
        return Err(SlotError::InvalidGenerationRange(format!(
            "start {} must be before end {}",
            clock::format(start),
            clock::format(end)
        )));
    }

    let step = Duration::minutes(duration_minutes);
    let mut slots = Vec::new();
    let mut current = start;

    loop {
        let (next, wrapped_seconds) = current.overflowing_add_signed(step);
        if wrapped_seconds != 0 || next > end {
            break;
        }
        slots.push(Slot::available(current, next));
        current = next;
    }

    tracing::debug!(
        "Generated {} slots from {} to {} ({} min)",
        slots.len(),
        clock::format(start),
        clock::format(end),
        duration_minutes
    );

    Ok(slots)
}
