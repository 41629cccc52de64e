//! Demobook Storage Layer
//!
//! This crate provides the booking store and contractor directory
//! implementations used by the scheduler:
//!
//! - PostgreSQL connection pool management and embedded migrations
//! - sqlx repositories backed by an exclusion constraint on booking intervals
//! - An in-memory store with the same check-and-insert guarantee

pub mod memory;
pub mod pool;
pub mod repositories;

pub use memory::{InMemoryBookingStore, InMemoryContractorDirectory};
pub use pool::{create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use demobook_core::{AppError, AppResult};
pub use sqlx::PgPool;
