//! Demo booking repository implementation
//!
//! Overlap safety comes from the `demo_bookings_no_overlap` exclusion
//! constraint: the database rejects an insert whose interval intersects a
//! non-cancelled booking, so check-and-insert is a single statement.

use demobook_core::{
    models::{Booking, BookingFilter, BookingStatus, ContactMethod},
    traits::BookingStore,
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::BTreeMap;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

/// SQLSTATE for exclusion constraint violations
const EXCLUSION_VIOLATION: &str = "23P01";

/// SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

const BOOKING_COLUMNS: &str = r#"
    id, contractor_id, demo_date, demo_end, status, preferred_contact_method,
    notes, meeting_link, confirmation_sent, created_at, updated_at
"#;

/// PostgreSQL implementation of BookingStore
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Parse booking status from string
    fn parse_status(s: &str) -> BookingStatus {
        BookingStatus::from_str(s).unwrap_or_else(|| {
            warn!("Unknown booking status in database: {}", s);
            BookingStatus::Scheduled
        })
    }

    /// Parse contact method from string
    fn parse_contact_method(s: &str) -> ContactMethod {
        ContactMethod::from_str(s).unwrap_or_default()
    }

    /// Whether the error is a booking interval collision
    fn is_overlap_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .and_then(|db| db.code())
            .map(|code| code == EXCLUSION_VIOLATION || code == UNIQUE_VIOLATION)
            .unwrap_or(false)
    }
}

#[async_trait]
impl BookingStore for PgBookingRepository {
    #[instrument(skip(self, booking), fields(booking_id = %booking.id, demo_date = %booking.demo_date))]
    async fn insert(&self, booking: &Booking) -> AppResult<Booking> {
        debug!("Inserting booking for contractor {}", booking.contractor_id);

        let query = format!(
            r#"
            INSERT INTO demo_bookings (
                id, contractor_id, demo_date, demo_end, status, preferred_contact_method,
                notes, meeting_link, confirmation_sent, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&query)
            .bind(booking.id)
            .bind(booking.contractor_id)
            .bind(booking.demo_date)
            .bind(booking.demo_end)
            .bind(booking.status.as_str())
            .bind(booking.preferred_contact_method.as_str())
            .bind(&booking.notes)
            .bind(&booking.meeting_link)
            .bind(booking.confirmation_sent)
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if Self::is_overlap_violation(&e) {
                    debug!("Booking interval already taken");
                    return AppError::SlotUnavailable(booking.demo_date.to_rfc3339());
                }
                error!("Database error inserting booking: {}", e);
                AppError::Database(format!("Failed to insert booking: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn find_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let query = format!(
            r#"
            SELECT {}
            FROM demo_bookings
            WHERE demo_date < $2
                AND demo_end > $1
                AND status <> 'cancelled'
            ORDER BY demo_date ASC
            "#,
            BOOKING_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&query)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding overlapping bookings: {}", e);
                AppError::Database(format!("Failed to query bookings: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        debug!("Finding booking by id: {}", id);

        let query = format!("SELECT {} FROM demo_bookings WHERE id = $1", BOOKING_COLUMNS);

        let result = sqlx::query_as::<sqlx::Postgres, BookingRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding booking {}: {}", id, e);
                AppError::Database(format!("Failed to find booking: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self, notes))]
    async fn update_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        status: BookingStatus,
        notes: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        debug!("Updating booking {} status {} -> {}", id, expected, status);

        let query = format!(
            r#"
            UPDATE demo_bookings
            SET status = $3,
                notes = COALESCE($4, notes),
                updated_at = GREATEST(updated_at, $5)
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(status.as_str())
            .bind(notes)
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating booking {}: {}", id, e);
                AppError::Database(format!("Failed to update booking status: {}", e))
            })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Booking>, i64)> {
        debug!("Listing bookings with limit {} offset {}", limit, offset);

        let status = filter.status.map(|s| s.as_str());

        let query = format!(
            r#"
            SELECT {}
            FROM demo_bookings
            WHERE ($1::TEXT IS NULL OR status = $1)
                AND ($2::INTEGER IS NULL OR contractor_id = $2)
            ORDER BY demo_date DESC, created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            BOOKING_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&query)
            .bind(status)
            .bind(filter.contractor_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing bookings: {}", e);
                AppError::Database(format!("Failed to fetch bookings: {}", e))
            })?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM demo_bookings
            WHERE ($1::TEXT IS NULL OR status = $1)
                AND ($2::INTEGER IS NULL OR contractor_id = $2)
            "#,
        )
        .bind(status)
        .bind(filter.contractor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting bookings: {}", e);
            AppError::Database(format!("Failed to count bookings: {}", e))
        })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    #[instrument(skip(self))]
    async fn count_by_status(&self) -> AppResult<BTreeMap<BookingStatus, i64>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM demo_bookings GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    error!("Database error counting bookings by status: {}", e);
                    AppError::Database(format!("Failed to count bookings: {}", e))
                })?;

        let mut counts = BTreeMap::new();
        for (status, count) in rows {
            *counts.entry(Self::parse_status(&status)).or_insert(0) += count;
        }

        Ok(counts)
    }

    #[instrument(skip(self))]
    async fn count_upcoming(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM demo_bookings WHERE demo_date > $1 AND status <> 'cancelled'",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting upcoming bookings: {}", e);
            AppError::Database(format!("Failed to count bookings: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn count_past(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM demo_bookings WHERE demo_date <= $1")
                .bind(now)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    error!("Database error counting past bookings: {}", e);
                    AppError::Database(format!("Failed to count bookings: {}", e))
                })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn count_booked_days(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT (demo_date AT TIME ZONE 'UTC')::DATE)
            FROM demo_bookings
            WHERE status <> 'cancelled'
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting booked days: {}", e);
            AppError::Database(format!("Failed to count booked days: {}", e))
        })?;

        Ok(result.0)
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    contractor_id: i32,
    demo_date: DateTime<Utc>,
    demo_end: DateTime<Utc>,
    status: String,
    preferred_contact_method: String,
    notes: Option<String>,
    meeting_link: Option<String>,
    confirmation_sent: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            contractor_id: row.contractor_id,
            demo_date: row.demo_date,
            demo_end: row.demo_end,
            status: PgBookingRepository::parse_status(&row.status),
            preferred_contact_method: PgBookingRepository::parse_contact_method(
                &row.preferred_contact_method,
            ),
            notes: row.notes,
            meeting_link: row.meeting_link,
            confirmation_sent: row.confirmation_sent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(
            PgBookingRepository::parse_status("confirmed"),
            BookingStatus::Confirmed
        );
        assert_eq!(
            PgBookingRepository::parse_status("cancelled"),
            BookingStatus::Cancelled
        );
        assert_eq!(
            PgBookingRepository::parse_status("rescheduled"),
            BookingStatus::Rescheduled
        );
    }

    #[test]
    fn test_parse_contact_method() {
        assert_eq!(
            PgBookingRepository::parse_contact_method("phone"),
            ContactMethod::Phone
        );
        assert_eq!(
            PgBookingRepository::parse_contact_method("carrier pigeon"),
            ContactMethod::Video
        );
    }

    #[test]
    fn test_row_conversion() {
        let now = Utc::now();
        let row = BookingRow {
            id: Uuid::new_v4(),
            contractor_id: 3,
            demo_date: now,
            demo_end: now + chrono::Duration::minutes(30),
            status: "completed".to_string(),
            preferred_contact_method: "email".to_string(),
            notes: Some("bring pricing".to_string()),
            meeting_link: None,
            confirmation_sent: false,
            created_at: now,
            updated_at: now,
        };

        let booking: Booking = row.into();
        assert_eq!(booking.status, BookingStatus::Completed);
        assert_eq!(booking.preferred_contact_method, ContactMethod::Email);
        assert_eq!(booking.duration(), chrono::Duration::minutes(30));
    }
}
