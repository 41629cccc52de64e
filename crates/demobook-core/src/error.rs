//! Unified error handling for the booking backend
//!
//! Every failure the scheduling engine can report is a variant of
//! [`AppError`]. The variants group into the classes callers act on:
//! not found, invalid slot, slot conflict, invalid transition and store
//! unavailable. HTTP mapping is provided through `ResponseError`.

use crate::models::BookingStatus;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Store Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Scheduling Errors ====================
    #[error("Contractor not found: {0}")]
    ContractorNotFound(String),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Slot {0} is no longer available")]
    SlotUnavailable(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_) | AppError::InvalidInput(_) | AppError::InvalidSlot(_) => {
                StatusCode::BAD_REQUEST
            }

            // 404 Not Found
            AppError::ContractorNotFound(_)
            | AppError::BookingNotFound(_)
            | AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::SlotUnavailable(_) => StatusCode::CONFLICT,

            // 422 Unprocessable Entity
            AppError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable
            AppError::Database(_) | AppError::Pool(_) | AppError::Transaction(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            AppError::Internal(_) | AppError::Config(_) | AppError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::ContractorNotFound(_) => "contractor_not_found",
            AppError::BookingNotFound(_) => "booking_not_found",
            AppError::InvalidSlot(_) => "invalid_slot",
            AppError::SlotUnavailable(_) => "slot_unavailable",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// True for persistence failures. The engine never retries these.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Pool(_) | AppError::Transaction(_)
        )
    }

    /// True when the referenced contractor or booking does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::ContractorNotFound(_) | AppError::BookingNotFound(_) | AppError::NotFound(_)
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => AppError::Pool(err.to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::InvalidSlot("2026-13-01-09:00".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::BookingNotFound("42".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::SlotUnavailable("2026-01-12-09:00".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Completed,
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Database("connection reset".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::SlotUnavailable("x".to_string()).error_code(),
            "slot_unavailable"
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: BookingStatus::Completed,
                to: BookingStatus::Scheduled,
            }
            .error_code(),
            "invalid_transition"
        );
    }

    #[test]
    fn test_error_classes() {
        assert!(AppError::Pool("timed out".into()).is_store_unavailable());
        assert!(!AppError::SlotUnavailable("x".into()).is_store_unavailable());
        assert!(AppError::ContractorNotFound("7".into()).is_not_found());
        assert!(!AppError::InvalidSlot("x".into()).is_not_found());
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = AppError::InvalidTransition {
            from: BookingStatus::Cancelled,
            to: BookingStatus::Completed,
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition: cancelled -> completed"
        );
    }
}
