//! Demo booking model
//!
//! A booking reserves one slot of the single demo line for a contractor.
//! Bookings are never deleted: cancellation is a status change, so history
//! stays available for statistics.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Booking status
///
/// Lifecycle:
/// ```text
/// scheduled ──> confirmed ──> completed
///     │             │
///     ├─────────────┴──> cancelled
///     └─────────────┴──> rescheduled
/// scheduled ──────────────> completed
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Booked, awaiting confirmation
    #[default]
    Scheduled,
    /// Confirmed by the sales team
    Confirmed,
    /// Demo took place
    Completed,
    /// Cancelled; the slot is free again
    Cancelled,
    /// Superseded by another booking made separately
    Rescheduled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BookingStatus {
    /// Every status, in lifecycle order
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Scheduled,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Rescheduled,
    ];

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Some(BookingStatus::Scheduled),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "rescheduled" => Some(BookingStatus::Rescheduled),
            _ => None,
        }
    }

    /// Lowercase wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rescheduled => "rescheduled",
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            BookingStatus::Scheduled => "Scheduled",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Rescheduled => "Rescheduled",
        }
    }

    /// Legal targets from this status.
    pub fn allowed_transitions(&self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Scheduled => &[
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
                BookingStatus::Rescheduled,
            ],
            BookingStatus::Confirmed => &[
                BookingStatus::Completed,
                BookingStatus::Cancelled,
                BookingStatus::Rescheduled,
            ],
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Rescheduled => {
                &[]
            }
        }
    }

    /// Check the transition table
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Terminal statuses accept no further transitions
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Whether a booking in this status occupies its interval
    pub fn blocks_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

/// Preferred contact method for the demo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    Phone,
    Email,
    #[default]
    Video,
}

impl fmt::Display for ContactMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ContactMethod {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "phone" => Some(ContactMethod::Phone),
            "email" => Some(ContactMethod::Email),
            "video" => Some(ContactMethod::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactMethod::Phone => "phone",
            ContactMethod::Email => "email",
            ContactMethod::Video => "video",
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            ContactMethod::Phone => "Phone",
            ContactMethod::Email => "Email",
            ContactMethod::Video => "Video Call",
        }
    }
}

/// Demo booking entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier (UUID)
    pub id: Uuid,

    /// Contractor who owns the booking
    pub contractor_id: i32,

    /// Slot start (UTC)
    pub demo_date: DateTime<Utc>,

    /// Slot end (UTC), exclusive. Fixed when the booking is made.
    pub demo_end: DateTime<Utc>,

    /// Current status
    pub status: BookingStatus,

    /// Preferred contact method
    pub preferred_contact_method: ContactMethod,

    /// Free-text notes from the contractor or staff
    pub notes: Option<String>,

    /// Meeting link, if one has been attached
    pub meeting_link: Option<String>,

    /// Whether the confirmation notification went out
    pub confirmation_sent: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp, never earlier than `created_at`
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a new scheduled booking for the interval `[demo_date, demo_date + duration)`
    pub fn new(
        contractor_id: i32,
        demo_date: DateTime<Utc>,
        duration: Duration,
        preferred_contact_method: ContactMethod,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            contractor_id,
            demo_date,
            demo_end: demo_date + duration,
            status: BookingStatus::Scheduled,
            preferred_contact_method,
            notes,
            meeting_link: None,
            confirmation_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Booked duration
    pub fn duration(&self) -> Duration {
        self.demo_end - self.demo_date
    }

    /// Half-open overlap with `[start, end)`. Touching intervals do not overlap.
    #[inline]
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.demo_date < end && self.demo_end > start
    }

    /// Whether this booking blocks `[start, end)`
    pub fn conflicts_with(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.status.blocks_slot() && self.overlaps(start, end)
    }

    /// Demo starts after `now`
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.demo_date > now
    }

    /// Demo started at or before `now`
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.demo_date <= now
    }

    /// Not cancelled or rescheduled
    pub fn is_active(&self) -> bool {
        !matches!(
            self.status,
            BookingStatus::Cancelled | BookingStatus::Rescheduled
        )
    }
}

/// Filter for listing bookings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub contractor_id: Option<i32>,
}

impl BookingFilter {
    /// Check a booking against the filter
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.map_or(true, |s| booking.status == s)
            && self.contractor_id.map_or(true, |c| booking.contractor_id == c)
    }
}
