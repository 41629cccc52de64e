//! Bookable demo slots
//!
//! A slot is identified by its local start time in the business timezone,
//! encoded as `YYYY-MM-DD-HH:MM`. Ids are derived, never stored.

use crate::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot id text format
pub const SLOT_ID_FORMAT: &str = "%Y-%m-%d-%H:%M";

/// Slot identifier: local start date and time in the business timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SlotId(NaiveDateTime);

impl SlotId {
    pub fn new(local_start: NaiveDateTime) -> Self {
        Self(local_start)
    }

    /// Parse a slot id. Only the canonical zero-padded form is accepted.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let local = NaiveDateTime::parse_from_str(s, SLOT_ID_FORMAT)
            .map_err(|e| AppError::InvalidSlot(format!("{}: {}", s, e)))?;
        let id = Self(local);
        if id.to_string() != s {
            return Err(AppError::InvalidSlot(format!(
                "{}: expected format YYYY-MM-DD-HH:MM",
                s
            )));
        }
        Ok(id)
    }

    /// Local start date and time
    pub fn local_start(&self) -> NaiveDateTime {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.0.time()
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SLOT_ID_FORMAT))
    }
}

impl From<SlotId> for String {
    fn from(id: SlotId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for SlotId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SlotId::parse(&value)
    }
}

/// A generated slot with its availability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    /// Local date
    pub date: NaiveDate,
    /// Local start time
    pub start_time: NaiveTime,
    /// Local end time
    pub end_time: NaiveTime,
    /// Absolute start
    pub starts_at: DateTime<Utc>,
    /// Absolute end, exclusive
    pub ends_at: DateTime<Utc>,
    /// No active booking overlaps this slot
    pub available: bool,
}

impl Slot {
    /// Half-open overlap with `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.starts_at < end && self.ends_at > start
    }
}
