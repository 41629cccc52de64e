//! Demobook Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the demo-booking backend. It includes:
//!
//! - Domain models (Booking, Slot, Contractor, statistics)
//! - Store, directory, notifier and clock traits consumed by the scheduler
//! - Unified error handling with HTTP response mapping
//! - Application and scheduling configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::{AppConfig, SchedulingConfig, SchedulingPolicy, StorageBackend};
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

pub use models::{
    Booking, BookingFilter, BookingStats, BookingStatus, ContactMethod, Contractor, Slot, SlotId,
};
pub use traits::{BookingStore, Clock, ContractorDirectory, Notifier};
