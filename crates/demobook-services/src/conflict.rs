//! Conflict resolution
//!
//! A slot is taken when any non-cancelled booking overlaps it under
//! half-open interval semantics. Checks here are a fast path for friendly
//! errors and availability listings; the store's insert is authoritative.

use chrono::{DateTime, Duration, Utc};
use demobook_core::{models::Slot, traits::BookingStore, AppResult};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Availability checks against the booking store
#[derive(Clone)]
pub struct ConflictResolver {
    store: Arc<dyn BookingStore>,
}

impl ConflictResolver {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Whether `[start, start + duration)` is free
    #[instrument(skip(self))]
    pub async fn is_available(&self, start: DateTime<Utc>, duration: Duration) -> AppResult<bool> {
        let end = start + duration;
        let blocking = self.store.find_overlapping(start, end).await?;

        debug!(
            "Interval {} - {} has {} blocking bookings",
            start,
            end,
            blocking.len()
        );

        Ok(blocking.is_empty())
    }

    /// Mark each slot's availability using one range query over the whole span
    #[instrument(skip(self, slots), fields(slot_count = slots.len()))]
    pub async fn annotate(&self, mut slots: Vec<Slot>) -> AppResult<Vec<Slot>> {
        let span = slots
            .iter()
            .map(|s| s.starts_at)
            .min()
            .zip(slots.iter().map(|s| s.ends_at).max());

        let Some((start, end)) = span else {
            return Ok(slots);
        };

        let bookings = self.store.find_overlapping(start, end).await?;
        debug!("Found {} active bookings in range", bookings.len());

        for slot in &mut slots {
            slot.available = !bookings
                .iter()
                .any(|b| b.conflicts_with(slot.starts_at, slot.ends_at));
        }

        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot_generator::SlotGenerator;
    use chrono::TimeZone;
    use demobook_core::{
        models::{Booking, BookingStatus, ContactMethod},
        SchedulingPolicy,
    };
    use demobook_db::InMemoryBookingStore;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        // 2026-01-13, New York is UTC-5
        Utc.with_ymd_and_hms(2026, 1, 13, h + 5, m, 0).unwrap()
    }

    async fn store_with_booking(h: u32, m: u32) -> (Arc<InMemoryBookingStore>, Booking) {
        let store = Arc::new(InMemoryBookingStore::new());
        let booking = Booking::new(
            1,
            at(h, m),
            Duration::minutes(30),
            ContactMethod::Phone,
            None,
            at(0, 0),
        );
        store.insert(&booking).await.unwrap();
        (store, booking)
    }

    #[tokio::test]
    async fn test_is_available_half_open() {
        let (store, _) = store_with_booking(10, 0).await;
        let resolver = ConflictResolver::new(store);
        let half_hour = Duration::minutes(30);

        assert!(!resolver.is_available(at(10, 0), half_hour).await.unwrap());
        assert!(!resolver
            .is_available(at(10, 10), Duration::minutes(5))
            .await
            .unwrap());
        assert!(!resolver.is_available(at(9, 45), half_hour).await.unwrap());
        // Back-to-back neighbours stay free
        assert!(resolver.is_available(at(9, 30), half_hour).await.unwrap());
        assert!(resolver.is_available(at(10, 30), half_hour).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_frees_slot_and_sub_intervals() {
        let (store, booking) = store_with_booking(11, 0).await;
        let resolver = ConflictResolver::new(store.clone());

        for (m, len) in [(0, 30), (5, 10), (20, 10)] {
            assert!(!resolver
                .is_available(at(11, m), Duration::minutes(len))
                .await
                .unwrap());
        }

        store
            .update_status(
                booking.id,
                BookingStatus::Scheduled,
                BookingStatus::Cancelled,
                None,
                at(1, 0),
            )
            .await
            .unwrap();

        for (m, len) in [(0, 30), (5, 10), (20, 10)] {
            assert!(resolver
                .is_available(at(11, m), Duration::minutes(len))
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn test_annotate_marks_only_overlapping_slots() {
        let (store, _) = store_with_booking(9, 30).await;
        let resolver = ConflictResolver::new(store);

        // Monday 2026-01-12 08:00 local
        let now = Utc.with_ymd_and_hms(2026, 1, 12, 13, 0, 0).unwrap();
        let slots: Vec<Slot> = SlotGenerator::new(SchedulingPolicy::default())
            .generate(now)
            .collect();
        let total = slots.len();

        let annotated = resolver.annotate(slots).await.unwrap();
        let taken: Vec<String> = annotated
            .iter()
            .filter(|s| !s.available)
            .map(|s| s.id.to_string())
            .collect();

        assert_eq!(annotated.len(), total);
        assert_eq!(taken, vec!["2026-01-13-09:30".to_string()]);
    }

    #[tokio::test]
    async fn test_annotate_empty() {
        let resolver = ConflictResolver::new(Arc::new(InMemoryBookingStore::new()));
        assert!(resolver.annotate(Vec::new()).await.unwrap().is_empty());
    }
}
