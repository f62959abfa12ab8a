pub mod availability;
pub mod booking;
pub mod provider;
pub mod slot;
