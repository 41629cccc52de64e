//! Traits the scheduler depends on
//!
//! The booking store and contractor directory abstract persistence; the
//! notifier and clock abstract side effects so they can be swapped in tests.

use crate::error::AppError;
use crate::models::{Booking, BookingFilter, BookingStatus, Contractor};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Persistent booking store
///
/// Implementations must make [`BookingStore::insert`] atomic with respect to
/// overlap: two concurrent inserts for overlapping intervals can never both
/// succeed while either is non-cancelled.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a booking unless a non-cancelled booking overlaps its interval.
    ///
    /// Fails with [`AppError::SlotUnavailable`] on overlap.
    async fn insert(&self, booking: &Booking) -> Result<Booking, AppError>;

    /// Non-cancelled bookings overlapping `[start, end)`
    async fn find_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError>;

    /// Find booking by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError>;

    /// Move a booking from `expected` to `status`.
    ///
    /// Returns `None` when the booking is missing or its current status is
    /// no longer `expected`. Notes are replaced only when provided;
    /// `updated_at` never moves backwards.
    async fn update_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        status: BookingStatus,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError>;

    /// List bookings, newest demo first, with the total matching the filter
    async fn list(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Booking>, i64), AppError>;

    /// Booking counts per status. Statuses with no bookings may be absent.
    async fn count_by_status(&self) -> Result<BTreeMap<BookingStatus, i64>, AppError>;

    /// Non-cancelled bookings starting after `now`
    async fn count_upcoming(&self, now: DateTime<Utc>) -> Result<i64, AppError>;

    /// Bookings starting at or before `now`
    async fn count_past(&self, now: DateTime<Utc>) -> Result<i64, AppError>;

    /// Distinct UTC dates holding a non-cancelled booking
    async fn count_booked_days(&self) -> Result<i64, AppError>;
}

/// Read-only access to contractors
#[async_trait]
pub trait ContractorDirectory: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Contractor>, AppError>;
}

/// Outbound notifications about bookings
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A booking was created for `contractor`
    async fn booking_created(
        &self,
        contractor: &Contractor,
        booking: &Booking,
    ) -> Result<(), AppError>;
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
