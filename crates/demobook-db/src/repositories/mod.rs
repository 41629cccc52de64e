//! PostgreSQL repository implementations

pub mod booking_repo;
pub mod contractor_repo;

pub use booking_repo::PgBookingRepository;
pub use contractor_repo::PgContractorRepository;
