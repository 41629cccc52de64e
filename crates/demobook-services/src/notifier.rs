//! Booking notifications
//!
//! Delivery (email, chat) is handled outside this service. `LogNotifier`
//! records each confirmation request so it can be picked up from the logs.

use async_trait::async_trait;
use demobook_core::{
    models::{Booking, Contractor},
    traits::Notifier,
    AppResult,
};
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn booking_created(&self, contractor: &Contractor, booking: &Booking) -> AppResult<()> {
        info!(
            booking_id = %booking.id,
            to = %contractor.email,
            company = %contractor.company_name,
            demo_date = %booking.demo_date,
            contact_method = %booking.preferred_contact_method,
            "Demo confirmation requested for {}",
            contractor.greeting_name()
        );
        Ok(())
    }
}
