//! Slot generation
//!
//! Produces the candidate demo slots for a point in time: every weekday
//! from tomorrow through the end of the horizon, split into fixed-length
//! slots inside business hours. Generation is a pure function of the policy
//! and `now`; nothing is cached between calls.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use demobook_core::{models::Slot, SchedulingPolicy};

/// Slot generator bound to a scheduling policy
#[derive(Debug, Clone, Copy)]
pub struct SlotGenerator {
    policy: SchedulingPolicy,
}

impl SlotGenerator {
    pub fn new(policy: SchedulingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    /// Lazily generate slots, ordered by start time, without availability
    pub fn generate(&self, now: DateTime<Utc>) -> SlotIter {
        let (first, last) = self.policy.bookable_dates(now);
        SlotIter {
            policy: self.policy,
            starts: self.policy.slot_start_minutes().collect(),
            date: first,
            last,
            index: 0,
        }
    }
}

/// Iterator over generated slots
///
/// Local times that fall in a DST gap are skipped.
#[derive(Debug, Clone)]
pub struct SlotIter {
    policy: SchedulingPolicy,
    starts: Vec<u32>,
    date: NaiveDate,
    last: NaiveDate,
    index: usize,
}

impl SlotIter {
    fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    fn next_day(&mut self) {
        self.date += Duration::days(1);
        self.index = 0;
    }
}

impl Iterator for SlotIter {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        while self.date <= self.last {
            if Self::is_weekend(self.date) || self.index >= self.starts.len() {
                self.next_day();
                continue;
            }

            let minutes = self.starts[self.index];
            self.index += 1;

            let Some(time) = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0) else {
                continue;
            };
            if let Some(slot) = self.policy.build_slot(self.date.and_time(time)) {
                return Some(slot);
            }
        }
        None
    }
}
