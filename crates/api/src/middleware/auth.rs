//! # Authentication Module
//!
//! Provider credentials and the construction of the [`Session`] handlers pass
//! to the availability service.
//!
//! A provider created with a password must send it in the
//! [`PROVIDER_KEY_HEADER`] header on every provider-side request. Providers
//! without a password are open, like an unprotected shared calendar.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use axum::http::HeaderMap;
use eyre::Result;
use slotbook_core::errors::SlotError;
use slotbook_core::models::provider::Provider;
use slotbook_core::session::Session;
use tracing::debug;
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

pub const PROVIDER_KEY_HEADER: &str = "x-provider-key";

/// Hashes a password using the Argon2 algorithm
///
/// Returns the PHC string (algorithm, parameters, salt and hash), which is
/// what gets stored on the provider.
///
/// # Example
///
/// ```rust
/// use slotbook_api::middleware::auth::{hash_password, verify_password};
///
/// let hashed = hash_password("open sesame").unwrap();
/// assert!(verify_password(&hashed, "open sesame").unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String> {
    // Generate a fresh, random salt
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| eyre::eyre!("Error hashing password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Checks `password` against a stored PHC hash.
///
/// A wrong password is `Ok(false)`; only an unreadable hash is an error.
pub fn verify_password(password_hash: &str, password: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| eyre::eyre!("Invalid password hash: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Whether `password` unlocks `provider`. Unprotected providers accept anything.
pub fn provider_accepts(provider: &Provider, password: &str) -> Result<bool> {
    match &provider.password_hash {
        Some(hash) => verify_password(hash, password),
        None => Ok(true),
    }
}

/// Builds the provider session for a request acting on `provider_id`.
///
/// # Errors
///
/// * `NotFound` - the provider does not exist
/// * `Authentication` - the provider is protected and the header is missing
///   or wrong
pub async fn authorize_provider(
    state: &ApiState,
    provider_id: Uuid,
    headers: &HeaderMap,
) -> Result<Session, AppError> {
    let provider = state.service.provider(provider_id).await?;

    if let Some(hash) = &provider.password_hash {
        let key = headers
            .get(PROVIDER_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                SlotError::Authentication("Password required to manage this provider".to_string())
            })?;

        if !verify_password(hash, key)? {
            debug!("Rejected provider key for {}", provider_id);
            return Err(AppError(SlotError::Authentication(
                "Invalid password".to_string(),
            )));
        }
    }

    Ok(Session::provider(provider_id))
}
