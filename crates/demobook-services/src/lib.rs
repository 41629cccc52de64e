//! Scheduling services for demobook
//!
//! This crate holds the scheduling engine: slot generation, conflict
//! resolution and the booking lifecycle. Services depend only on the traits
//! in `demobook-core`, so any booking store, notifier or clock can be plugged in.
//!
//! # Services
//!
//! - `SlotGenerator` - Candidate slots for the booking horizon
//! - `ConflictResolver` - Availability checks against active bookings
//! - `BookingScheduler` - Schedule, update, cancel, list and summarise bookings
//! - `SystemClock` / `FixedClock` - Time sources
//! - `LogNotifier` - Logs confirmation requests

pub mod booking_manager;
pub mod clock;
pub mod conflict;
pub mod notifier;
pub mod slot_generator;

pub use booking_manager::{AvailableSlots, BookingPage, BookingScheduler, ScheduleDemo};
pub use clock::{FixedClock, SystemClock};
pub use conflict::ConflictResolver;
pub use notifier::LogNotifier;
pub use slot_generator::{SlotGenerator, SlotIter};

/// Business logic constants
pub mod constants {
    /// Bookings per page when the caller does not say
    pub const DEFAULT_PAGE_SIZE: i64 = 20;

    /// Largest page a caller may request
    pub const MAX_PAGE_SIZE: i64 = 100;

    /// Re-reads allowed when a booking changes under a status update
    pub const STATUS_UPDATE_ATTEMPTS: usize = 3;
}
