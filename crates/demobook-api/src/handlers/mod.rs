//! HTTP request handlers

pub mod booking;
pub mod health;

pub use booking::configure as configure_booking;
pub use health::configure as configure_health;
