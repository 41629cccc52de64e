//! Aggregate booking statistics

use super::BookingStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Booking counts as of a point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingStats {
    pub total: i64,
    pub by_status: BTreeMap<BookingStatus, i64>,
    /// Starting after now and not cancelled
    pub upcoming: i64,
    /// Started at or before now
    pub past: i64,
    pub avg_bookings_per_day: f64,
}

impl BookingStats {
    /// Build stats from raw counts.
    ///
    /// `booked_days` is the number of distinct days holding a non-cancelled
    /// booking; the average divides by at least one day and keeps two decimals.
    pub fn from_counts(
        by_status: BTreeMap<BookingStatus, i64>,
        upcoming: i64,
        past: i64,
        booked_days: i64,
    ) -> Self {
        let total = by_status.values().sum();
        let days = booked_days.max(1) as f64;
        let avg = ((total as f64 / days) * 100.0).round() / 100.0;

        Self {
            total,
            by_status,
            upcoming,
            past,
            avg_bookings_per_day: avg,
        }
    }

    /// Count for one status, zero when absent
    pub fn count(&self, status: BookingStatus) -> i64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
