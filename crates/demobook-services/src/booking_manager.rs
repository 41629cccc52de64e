//! Booking lifecycle manager
//!
//! Owns every mutation of a booking:
//! - Schedule a demo into a free slot
//! - Move a booking through its status lifecycle
//! - Cancel a booking, freeing its slot
//!
//! Reads (availability, listings, statistics) go through here as well so
//! that every caller sees the same clock and scheduling policy.

use chrono::{DateTime, Utc};
use demobook_core::{
    models::{
        Booking, BookingFilter, BookingStats, BookingStatus, ContactMethod, Contractor, Slot, SlotId,
    },
    traits::{BookingStore, Clock, ContractorDirectory, Notifier},
    AppError, AppResult, SchedulingPolicy,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::conflict::ConflictResolver;
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, STATUS_UPDATE_ATTEMPTS};
use crate::slot_generator::SlotGenerator;

/// Request to book a demo
#[derive(Debug, Clone)]
pub struct ScheduleDemo {
    pub contractor_id: i32,
    pub slot_id: String,
    pub contact_method: ContactMethod,
    pub notes: Option<String>,
}

/// Generated slots annotated with availability
#[derive(Debug, Clone)]
pub struct AvailableSlots {
    pub slots: Vec<Slot>,
    pub timezone: String,
    pub business_hours: String,
}

impl AvailableSlots {
    /// Number of slots still free
    pub fn available_count(&self) -> usize {
        self.slots.iter().filter(|s| s.available).count()
    }
}

/// One page of bookings
#[derive(Debug, Clone)]
pub struct BookingPage {
    pub bookings: Vec<Booking>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl BookingPage {
    pub fn total_pages(&self) -> i64 {
        if self.total == 0 {
            0
        } else {
            (self.total + self.page_size - 1) / self.page_size
        }
    }
}

/// Booking scheduler
///
/// Stateless apart from its collaborators; share it behind an `Arc`.
pub struct BookingScheduler {
    store: Arc<dyn BookingStore>,
    contractors: Arc<dyn ContractorDirectory>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    generator: SlotGenerator,
    resolver: ConflictResolver,
}

impl BookingScheduler {
    /// Create a new scheduler
    pub fn new(
        store: Arc<dyn BookingStore>,
        contractors: Arc<dyn ContractorDirectory>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: SchedulingPolicy,
    ) -> Self {
        Self {
            resolver: ConflictResolver::new(Arc::clone(&store)),
            generator: SlotGenerator::new(policy),
            store,
            contractors,
            notifier,
            clock,
        }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        self.generator.policy()
    }

    /// Current time according to the scheduler's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// All generated slots for the horizon, each marked available or taken
    #[instrument(skip(self))]
    pub async fn list_available_slots(&self) -> AppResult<AvailableSlots> {
        let now = self.clock.now();
        let slots: Vec<Slot> = self.generator.generate(now).collect();
        let slots = self.resolver.annotate(slots).await?;

        let result = AvailableSlots {
            slots,
            timezone: self.policy().timezone().name().to_string(),
            business_hours: self.policy().business_hours_label(),
        };

        info!(
            "Generated {} slots, {} available",
            result.slots.len(),
            result.available_count()
        );

        Ok(result)
    }

    /// Book a demo for a contractor
    ///
    /// # Errors
    ///
    /// - `ContractorNotFound` if the contractor does not exist
    /// - `InvalidSlot` if the slot id is malformed or not offered
    /// - `SlotUnavailable` if an active booking already holds the slot
    #[instrument(skip(self, request), fields(contractor_id = request.contractor_id, slot_id = %request.slot_id))]
    pub async fn schedule_demo(&self, request: ScheduleDemo) -> AppResult<Booking> {
        let contractor = self
            .contractors
            .find_by_id(request.contractor_id)
            .await?
            .ok_or_else(|| AppError::ContractorNotFound(request.contractor_id.to_string()))?;

        let now = self.clock.now();
        let slot_id = SlotId::parse(&request.slot_id)?;
        let slot = self.policy().resolve_slot(&slot_id, now)?;

        // Fast path; the insert below is the authoritative check
        if !self
            .resolver
            .is_available(slot.starts_at, self.policy().slot_duration())
            .await?
        {
            warn!("Slot {} is already booked", slot_id);
            return Err(AppError::SlotUnavailable(slot_id.to_string()));
        }

        let booking = Booking::new(
            contractor.id,
            slot.starts_at,
            self.policy().slot_duration(),
            request.contact_method,
            request.notes,
            now,
        );

        let booking = self.store.insert(&booking).await.map_err(|e| match e {
            AppError::SlotUnavailable(_) => {
                warn!("Slot {} was taken concurrently", slot_id);
                AppError::SlotUnavailable(slot_id.to_string())
            }
            other => other,
        })?;

        info!(
            booking_id = %booking.id,
            "Scheduled demo for contractor {} at {}",
            contractor.id, slot_id
        );

        self.dispatch_confirmation(contractor, booking.clone());

        Ok(booking)
    }

    /// Fire-and-forget confirmation; failures are logged only
    fn dispatch_confirmation(&self, contractor: Contractor, booking: Booking) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.booking_created(&contractor, &booking).await {
                warn!(
                    booking_id = %booking.id,
                    "Failed to send booking confirmation to {}: {}",
                    contractor.email, e
                );
            }
        });
    }

    /// Fetch a booking by id
    #[instrument(skip(self))]
    pub async fn get_booking(&self, id: Uuid) -> AppResult<Booking> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::BookingNotFound(id.to_string()))
    }

    /// Move a booking to `status`, replacing notes when provided
    ///
    /// # Errors
    ///
    /// - `BookingNotFound` if the booking does not exist
    /// - `InvalidTransition` if the lifecycle forbids the change
    #[instrument(skip(self, notes))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        notes: Option<String>,
    ) -> AppResult<Booking> {
        self.transition(id, status, notes.as_deref(), false).await
    }

    /// Cancel a booking. Cancelling an already-cancelled booking succeeds
    /// without changes.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: Uuid) -> AppResult<Booking> {
        self.transition(id, BookingStatus::Cancelled, None, true).await
    }

    async fn transition(
        &self,
        id: Uuid,
        target: BookingStatus,
        notes: Option<&str>,
        idempotent: bool,
    ) -> AppResult<Booking> {
        for _ in 0..STATUS_UPDATE_ATTEMPTS {
            let current = self.get_booking(id).await?;

            if idempotent && current.status == target {
                debug!("Booking {} already {}", id, target);
                return Ok(current);
            }

            if !current.status.can_transition_to(target) {
                warn!("Rejected transition {} -> {} for {}", current.status, target, id);
                return Err(AppError::InvalidTransition {
                    from: current.status,
                    to: target,
                });
            }

            let updated = self
                .store
                .update_status(id, current.status, target, notes, self.clock.now())
                .await?;

            if let Some(booking) = updated {
                info!("Booking {} status {} -> {}", id, current.status, target);
                return Ok(booking);
            }

            debug!("Booking {} changed concurrently, re-reading", id);
        }

        Err(AppError::Internal(format!(
            "Booking {} kept changing during status update",
            id
        )))
    }

    /// List bookings, newest demo first
    ///
    /// `page` is 1-based; `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
    #[instrument(skip(self))]
    pub async fn list_bookings(
        &self,
        filter: BookingFilter,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> AppResult<BookingPage> {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * page_size;

        let (bookings, total) = self.store.list(&filter, page_size, offset).await?;
        debug!("Listed {} of {} bookings", bookings.len(), total);

        Ok(BookingPage {
            bookings,
            total,
            page,
            page_size,
        })
    }

    /// Aggregate statistics as of now
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> AppResult<BookingStats> {
        let now = self.clock.now();

        let counts = self.store.count_by_status().await?;
        let by_status: BTreeMap<BookingStatus, i64> = BookingStatus::ALL
            .iter()
            .map(|s| (*s, counts.get(s).copied().unwrap_or(0)))
            .collect();

        let upcoming = self.store.count_upcoming(now).await?;
        let past = self.store.count_past(now).await?;
        let booked_days = self.store.count_booked_days().await?;

        Ok(BookingStats::from_counts(by_status, upcoming, past, booked_days))
    }
}
