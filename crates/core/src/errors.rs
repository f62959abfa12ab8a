use thiserror::Error;

use crate::models::slot::{SlotId, SlotStatus};

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Invalid generation range: {0}")]
    InvalidGenerationRange(String),

    #[error("Slot not found: {0}")]
    SlotNotFound(String),

    #[error("Slot {slot_id} is no longer available (currently {status})")]
    SlotNotAvailable { slot_id: SlotId, status: String },

    #[error("Availability was modified concurrently: expected version {expected}, found {actual}")]
    VersionConflict { expected: i64, actual: i64 },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl SlotError {
    pub fn not_available(slot_id: SlotId, status: &SlotStatus) -> Self {
        SlotError::SlotNotAvailable {
            slot_id,
            status: status.kind().to_string(),
        }
    }

    /// Store failures are transient; everything else needs a different request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SlotError::StoreUnavailable(_))
    }
}

pub type SlotResult<T> = Result<T, SlotError>;
