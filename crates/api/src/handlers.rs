/// Slot generation, availability documents and live updates
pub mod availability;
/// Customer bookings and provider notifications
pub mod booking;
/// Provider registration and credentials
pub mod provider;
