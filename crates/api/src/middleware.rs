/// Provider credentials and session construction
pub mod auth;
/// Mapping of domain errors to HTTP responses
pub mod error_handling;
