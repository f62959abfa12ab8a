//! # Error Handling Middleware
//!
//! Maps [`SlotError`] to HTTP status codes and the JSON error body
//! `{"error": "<message>", "retryable": <bool>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use slotbook_core::errors::SlotError;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use slotbook_api::middleware::error_handling::AppError;
/// use slotbook_core::errors::SlotError;
///
/// async fn handler(name: String) -> Result<Json<String>, AppError> {
///     if name.is_empty() {
///         return Err(AppError(SlotError::Validation("Name is required".to_string())));
///     }
///     Ok(Json(name))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub SlotError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SlotError::InvalidGenerationRange(_) => StatusCode::BAD_REQUEST,
            SlotError::SlotNotFound(_) => StatusCode::NOT_FOUND,
            SlotError::SlotNotAvailable { .. } => StatusCode::CONFLICT,
            SlotError::VersionConflict { .. } => StatusCode::CONFLICT,
            SlotError::NotFound(_) => StatusCode::NOT_FOUND,
            SlotError::Validation(_) => StatusCode::BAD_REQUEST,
            SlotError::Authentication(_) => StatusCode::UNAUTHORIZED,
            SlotError::Authorization(_) => StatusCode::FORBIDDEN,
            SlotError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SlotError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed with {}: {:?}", status, self.0);
        }

        let body = Json(json!({
            "error": self.0.to_string(),
            "retryable": self.0.is_retryable(),
        }));

        (status, body).into_response()
    }
}

/// Automatic conversion from SlotError to AppError
impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        AppError(err)
    }
}

/// Failures outside the store, such as password hashing, are internal errors.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(SlotError::Internal(err.into()))
    }
}

/// Maps a SlotError to an HTTP response
pub fn map_error(err: SlotError) -> Response {
    AppError(err).into_response()
}
