//! Domain models for demo booking

pub mod booking;
pub mod contractor;
pub mod slot;
pub mod stats;

pub use booking::{Booking, BookingFilter, BookingStatus, ContactMethod};
pub use contractor::Contractor;
pub use slot::{Slot, SlotId, SLOT_ID_FORMAT};
pub use stats::BookingStats;
