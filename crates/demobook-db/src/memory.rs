//! In-memory booking store and contractor directory
//!
//! Used for local runs without PostgreSQL and throughout the test suites.
//! The overlap check and the insert happen under one lock, which gives the
//! same guarantee as the exclusion constraint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use demobook_core::{
    models::{Booking, BookingFilter, BookingStatus, Contractor},
    traits::{BookingStore, ContractorDirectory},
    AppError, AppResult,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Booking store held in process memory
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bookings, cancelled included
    pub fn len(&self) -> usize {
        self.bookings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.lock().is_empty()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    #[instrument(skip(self, booking), fields(booking_id = %booking.id, demo_date = %booking.demo_date))]
    async fn insert(&self, booking: &Booking) -> AppResult<Booking> {
        let mut bookings = self.bookings.lock();

        if bookings
            .values()
            .any(|b| b.conflicts_with(booking.demo_date, booking.demo_end))
        {
            debug!("Booking interval already taken");
            return Err(AppError::SlotUnavailable(booking.demo_date.to_rfc3339()));
        }

        if bookings.contains_key(&booking.id) {
            return Err(AppError::Internal(format!(
                "Duplicate booking id {}",
                booking.id
            )));
        }

        bookings.insert(booking.id, booking.clone());
        Ok(booking.clone())
    }

    async fn find_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let bookings = self.bookings.lock();
        let mut found: Vec<Booking> = bookings
            .values()
            .filter(|b| b.conflicts_with(start, end))
            .cloned()
            .collect();
        found.sort_by_key(|b| b.demo_date);
        Ok(found)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.bookings.lock().get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        status: BookingStatus,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let mut bookings = self.bookings.lock();

        let Some(booking) = bookings.get_mut(&id) else {
            return Ok(None);
        };
        if booking.status != expected {
            return Ok(None);
        }

        booking.status = status;
        if let Some(notes) = notes {
            booking.notes = Some(notes.to_string());
        }
        booking.updated_at = booking.updated_at.max(at);

        Ok(Some(booking.clone()))
    }

    async fn list(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Booking>, i64)> {
        let bookings = self.bookings.lock();
        let mut matching: Vec<&Booking> = bookings.values().filter(|b| filter.matches(b)).collect();
        matching.sort_by(|a, b| {
            b.demo_date
                .cmp(&a.demo_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn count_by_status(&self) -> AppResult<BTreeMap<BookingStatus, i64>> {
        let mut counts = BTreeMap::new();
        for booking in self.bookings.lock().values() {
            *counts.entry(booking.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn count_upcoming(&self, now: DateTime<Utc>) -> AppResult<i64> {
        Ok(self
            .bookings
            .lock()
            .values()
            .filter(|b| b.is_upcoming(now) && b.status.blocks_slot())
            .count() as i64)
    }

    async fn count_past(&self, now: DateTime<Utc>) -> AppResult<i64> {
        Ok(self
            .bookings
            .lock()
            .values()
            .filter(|b| b.is_past(now))
            .count() as i64)
    }

    async fn count_booked_days(&self) -> AppResult<i64> {
        let days: BTreeSet<_> = self
            .bookings
            .lock()
            .values()
            .filter(|b| b.status.blocks_slot())
            .map(|b| b.demo_date.date_naive())
            .collect();
        Ok(days.len() as i64)
    }
}

/// Contractor directory held in process memory
#[derive(Default)]
pub struct InMemoryContractorDirectory {
    contractors: RwLock<HashMap<i32, Contractor>>,
}

impl InMemoryContractorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from existing contractors
    pub fn with_contractors(contractors: impl IntoIterator<Item = Contractor>) -> Self {
        let directory = Self::new();
        for contractor in contractors {
            directory.add(contractor);
        }
        directory
    }

    pub fn add(&self, contractor: Contractor) {
        self.contractors.write().insert(contractor.id, contractor);
    }
}

#[async_trait]
impl ContractorDirectory for InMemoryContractorDirectory {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Contractor>> {
        Ok(self.contractors.read().get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use demobook_core::models::ContactMethod;

    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, h, m, 0).unwrap()
    }

    fn booking(day: u32, h: u32, m: u32) -> Booking {
        Booking::new(
            1,
            at(day, h, m),
            Duration::minutes(30),
            ContactMethod::Video,
            None,
            at(5, 12, 0),
        )
    }

    #[tokio::test]
    async fn test_insert_rejects_overlap() {
        let store = InMemoryBookingStore::new();
        store.insert(&booking(12, 14, 0)).await.unwrap();

        let err = store.insert(&booking(12, 14, 15)).await.unwrap_err();
        assert!(matches!(err, AppError::SlotUnavailable(_)));

        // Adjacent intervals are fine
        store.insert(&booking(12, 14, 30)).await.unwrap();
        store.insert(&booking(12, 13, 30)).await.unwrap();
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_booking_frees_interval() {
        let store = InMemoryBookingStore::new();
        let first = store.insert(&booking(12, 14, 0)).await.unwrap();

        let updated = store
            .update_status(
                first.id,
                BookingStatus::Scheduled,
                BookingStatus::Cancelled,
                None,
                at(6, 9, 0),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Cancelled);

        assert!(store
            .find_overlapping(at(12, 14, 0), at(12, 14, 30))
            .await
            .unwrap()
            .is_empty());
        store.insert(&booking(12, 14, 0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_status_compare_and_set() {
        let store = InMemoryBookingStore::new();
        let b = store.insert(&booking(12, 9, 0)).await.unwrap();

        let stale = store
            .update_status(
                b.id,
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                None,
                at(6, 9, 0),
            )
            .await
            .unwrap();
        assert!(stale.is_none());

        let missing = store
            .update_status(
                Uuid::new_v4(),
                BookingStatus::Scheduled,
                BookingStatus::Confirmed,
                None,
                at(6, 9, 0),
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_status_notes_and_timestamp() {
        let store = InMemoryBookingStore::new();
        let mut b = booking(12, 9, 0);
        b.notes = Some("original".to_string());
        let b = store.insert(&b).await.unwrap();

        // Clock behind created_at: updated_at must not regress
        let confirmed = store
            .update_status(
                b.id,
                BookingStatus::Scheduled,
                BookingStatus::Confirmed,
                None,
                at(1, 0, 0),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(confirmed.notes.as_deref(), Some("original"));
        assert_eq!(confirmed.updated_at, b.created_at);

        let completed = store
            .update_status(
                b.id,
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                Some("went well"),
                at(12, 10, 0),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(completed.notes.as_deref(), Some("went well"));
        assert_eq!(completed.updated_at, at(12, 10, 0));
    }

    #[tokio::test]
    async fn test_list_orders_and_paginates() {
        let store = InMemoryBookingStore::new();
        for day in [12, 13, 14, 15] {
            store.insert(&booking(day, 9, 0)).await.unwrap();
        }

        let (page, total) = store.list(&BookingFilter::default(), 2, 1).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].demo_date, at(14, 9, 0));
        assert_eq!(page[1].demo_date, at(13, 9, 0));

        let filter = BookingFilter {
            status: Some(BookingStatus::Cancelled),
            contractor_id: None,
        };
        let (page, total) = store.list(&filter, 10, 0).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_counts() {
        let store = InMemoryBookingStore::new();
        let a = store.insert(&booking(12, 9, 0)).await.unwrap();
        store.insert(&booking(12, 10, 0)).await.unwrap();
        store.insert(&booking(14, 9, 0)).await.unwrap();
        store
            .update_status(
                a.id,
                BookingStatus::Scheduled,
                BookingStatus::Cancelled,
                None,
                at(6, 0, 0),
            )
            .await
            .unwrap();

        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts.get(&BookingStatus::Scheduled), Some(&2));
        assert_eq!(counts.get(&BookingStatus::Cancelled), Some(&1));

        assert_eq!(store.count_upcoming(at(12, 9, 30)).await.unwrap(), 2);
        assert_eq!(store.count_past(at(12, 9, 30)).await.unwrap(), 1);
        assert_eq!(store.count_booked_days().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_contractor_directory() {
        let directory = InMemoryContractorDirectory::with_contractors([Contractor {
            id: 7,
            email: "owner@buildright.test".to_string(),
            company_name: "BuildRight".to_string(),
            contact_name: None,
        }]);

        assert!(directory.find_by_id(7).await.unwrap().is_some());
        assert!(directory.find_by_id(8).await.unwrap().is_none());
    }
}
