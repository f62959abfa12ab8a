use axum::http::StatusCode;
use rstest::rstest;
use slotbook_api::middleware::auth;
use slotbook_api::middleware::error_handling::map_error;
use slotbook_core::errors::SlotError;
use slotbook_core::models::slot::{SlotId, SlotStatus};

#[rstest]
#[case(SlotError::InvalidGenerationRange("start after end".into()), StatusCode::BAD_REQUEST)]
#[case(SlotError::SlotNotFound("slot".into()), StatusCode::NOT_FOUND)]
#[case(SlotError::not_available(SlotId::new(), &SlotStatus::Busy), StatusCode::CONFLICT)]
#[case(SlotError::VersionConflict { expected: 1, actual: 2 }, StatusCode::CONFLICT)]
#[case(SlotError::NotFound("provider".into()), StatusCode::NOT_FOUND)]
#[case(SlotError::Validation("Invalid input".into()), StatusCode::BAD_REQUEST)]
#[case(SlotError::Authentication("Invalid password".into()), StatusCode::UNAUTHORIZED)]
#[case(SlotError::Authorization("Not authorized".into()), StatusCode::FORBIDDEN)]
#[case(SlotError::StoreUnavailable(eyre::eyre!("timed out")), StatusCode::SERVICE_UNAVAILABLE)]
#[case(
    SlotError::Internal(Box::new(std::io::Error::new(std::io::ErrorKind::Other, "Internal error"))),
    StatusCode::INTERNAL_SERVER_ERROR
)]
fn test_error_status_mapping(#[case] error: SlotError, #[case] expected: StatusCode) {
    // Map the error to a response
    let response = map_error(error);

    // Assert the response has the correct status code
    assert_eq!(response.status(), expected);
}

#[test]
fn test_password_hashing() {
    let password = "secure_password123";

    // Hash the password
    let hash = auth::hash_password(password).unwrap();

    // Verify the hash is not the plaintext
    assert_ne!(hash, password);

    // Verify the password against the hash
    assert!(auth::verify_password(&hash, password).unwrap());
    assert!(!auth::verify_password(&hash, "wrong_password").unwrap());
}

#[test]
fn test_hashes_are_salted() {
    let first = auth::hash_password("same").unwrap();
    let second = auth::hash_password("same").unwrap();

    assert_ne!(first, second);
}

#[test]
fn test_unreadable_hash_is_an_error() {
    assert!(auth::verify_password("not-a-phc-string", "anything").is_err());
}
