//! # Slotbook Core
//!
//! Domain layer for provider availability: slot generation, slot status
//! transitions, the store contracts the persistence layer implements, and the
//! availability service that the HTTP layer drives.

pub mod errors;
pub mod generator;
pub mod models;
pub mod service;
pub mod session;
pub mod store;
pub mod transition;
