//! Booking DTOs

use chrono::{DateTime, Utc};
use demobook_core::{
    models::{Booking, BookingStats, BookingStatus, ContactMethod, Slot},
    AppError,
};
use demobook_services::{AvailableSlots, BookingPage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One generated slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotResponse {
    pub slot_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
    pub available: bool,
}

impl From<&Slot> for TimeSlotResponse {
    fn from(slot: &Slot) -> Self {
        Self {
            slot_id: slot.id.to_string(),
            date: slot.date.format("%Y-%m-%d").to_string(),
            start_time: slot.start_time.format("%H:%M").to_string(),
            end_time: slot.end_time.format("%H:%M").to_string(),
            available: slot.available,
        }
    }
}

/// Availability listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    /// Number of slots still free
    pub total_slots: usize,
    /// Every generated slot, free or taken
    pub slots: Vec<TimeSlotResponse>,
    pub timezone: String,
    pub business_hours: String,
}

impl From<AvailableSlots> for AvailableSlotsResponse {
    fn from(available: AvailableSlots) -> Self {
        Self {
            total_slots: available.available_count(),
            slots: available.slots.iter().map(TimeSlotResponse::from).collect(),
            timezone: available.timezone,
            business_hours: available.business_hours,
        }
    }
}

/// Request to book a demo
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScheduleDemoRequest {
    #[validate(range(min = 1))]
    pub contractor_id: i32,

    /// Slot id from the availability listing (`YYYY-MM-DD-HH:MM`)
    #[validate(length(min = 1, max = 32))]
    pub slot_id: String,

    /// `phone`, `email` or `video` (default)
    pub preferred_contact_method: Option<String>,

    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

impl ScheduleDemoRequest {
    pub fn contact_method(&self) -> Result<ContactMethod, AppError> {
        match self.preferred_contact_method.as_deref() {
            None => Ok(ContactMethod::default()),
            Some(s) => ContactMethod::from_str(s)
                .ok_or_else(|| AppError::Validation(format!("Invalid contact method: {}", s))),
        }
    }
}

/// Status change request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookingStatusUpdate {
    pub status: String,

    /// Replaces the booking notes when present
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

impl BookingStatusUpdate {
    pub fn parsed_status(&self) -> Result<BookingStatus, AppError> {
        parse_status(&self.status)
    }
}

/// Listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilterParams {
    pub status: Option<String>,
    pub contractor_id: Option<i32>,
}

impl BookingFilterParams {
    pub fn parsed_status(&self) -> Result<Option<BookingStatus>, AppError> {
        self.status.as_deref().map(parse_status).transpose()
    }
}

fn parse_status(s: &str) -> Result<BookingStatus, AppError> {
    BookingStatus::from_str(s)
        .ok_or_else(|| AppError::Validation(format!("Invalid booking status: {}", s)))
}

/// Booking as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub contractor_id: i32,
    pub demo_date: DateTime<Utc>,
    pub demo_end: DateTime<Utc>,
    pub status: BookingStatus,
    pub status_display: String,
    pub preferred_contact_method: ContactMethod,
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
    pub confirmation_sent: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            status_display: booking.status.display_name().to_string(),
            is_active: booking.is_active(),
            id: booking.id,
            contractor_id: booking.contractor_id,
            demo_date: booking.demo_date,
            demo_end: booking.demo_end,
            status: booking.status,
            preferred_contact_method: booking.preferred_contact_method,
            notes: booking.notes,
            meeting_link: booking.meeting_link,
            confirmation_sent: booking.confirmation_sent,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// Paginated booking list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl From<BookingPage> for BookingListResponse {
    fn from(page: BookingPage) -> Self {
        Self {
            total_pages: page.total_pages(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            bookings: page.bookings.into_iter().map(Into::into).collect(),
        }
    }
}

/// Booking statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingStatsResponse {
    pub total_bookings: i64,
    pub scheduled: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub rescheduled: i64,
    pub upcoming_bookings: i64,
    pub past_bookings: i64,
    pub avg_bookings_per_day: f64,
}

impl From<BookingStats> for BookingStatsResponse {
    fn from(stats: BookingStats) -> Self {
        Self {
            total_bookings: stats.total,
            scheduled: stats.count(BookingStatus::Scheduled),
            confirmed: stats.count(BookingStatus::Confirmed),
            completed: stats.count(BookingStatus::Completed),
            cancelled: stats.count(BookingStatus::Cancelled),
            rescheduled: stats.count(BookingStatus::Rescheduled),
            upcoming_bookings: stats.upcoming,
            past_bookings: stats.past,
            avg_bookings_per_day: stats.avg_bookings_per_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_schedule_request_validation() {
        let req = ScheduleDemoRequest {
            contractor_id: 1,
            slot_id: "2026-01-12-09:00".to_string(),
            preferred_contact_method: None,
            notes: Some("x".repeat(500)),
        };
        assert!(req.validate().is_ok());
        assert_eq!(req.contact_method().unwrap(), ContactMethod::Video);

        let req = ScheduleDemoRequest {
            notes: Some("x".repeat(501)),
            ..req
        };
        assert!(req.validate().is_err());

        let req = ScheduleDemoRequest {
            notes: None,
            preferred_contact_method: Some("fax".to_string()),
            ..req
        };
        assert!(matches!(req.contact_method(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_status_parsing() {
        let update = BookingStatusUpdate {
            status: "confirmed".to_string(),
            notes: None,
        };
        assert_eq!(update.parsed_status().unwrap(), BookingStatus::Confirmed);

        let filters = BookingFilterParams {
            status: Some("archived".to_string()),
            contractor_id: None,
        };
        assert!(filters.parsed_status().is_err());
        assert_eq!(BookingFilterParams::default().parsed_status().unwrap(), None);
    }

    #[test]
    fn test_booking_response() {
        let start = Utc.with_ymd_and_hms(2026, 1, 12, 14, 0, 0).unwrap();
        let booking = Booking::new(
            5,
            start,
            Duration::minutes(30),
            ContactMethod::Phone,
            None,
            start - Duration::days(3),
        );

        let response = BookingResponse::from(booking);
        assert_eq!(response.status_display, "Scheduled");
        assert!(response.is_active);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "scheduled");
        assert_eq!(json["preferred_contact_method"], "phone");
        assert!(json["meeting_link"].is_null());
    }

    #[test]
    fn test_stats_response_zero_fills() {
        let response = BookingStatsResponse::from(BookingStats::default());
        assert_eq!(response.total_bookings, 0);
        assert_eq!(response.rescheduled, 0);
        assert_eq!(response.avg_bookings_per_day, 0.0);
    }
}
