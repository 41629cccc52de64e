//! Booking handlers
//!
//! HTTP handlers for demo availability and booking management.

use crate::dto::booking::{
    AvailableSlotsResponse, BookingFilterParams, BookingListResponse, BookingResponse,
    BookingStatsResponse, BookingStatusUpdate, ScheduleDemoRequest,
};
use crate::dto::{ApiResponse, PaginationParams};
use actix_web::{web, HttpResponse};
use demobook_core::{models::BookingFilter, AppError};
use demobook_services::{BookingScheduler, ScheduleDemo};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Available demo slots for the booking horizon
///
/// GET /api/v1/booking/available-slots
#[instrument(skip(scheduler))]
pub async fn get_available_slots(
    scheduler: web::Data<BookingScheduler>,
) -> Result<HttpResponse, AppError> {
    let available = scheduler.list_available_slots().await?;
    Ok(HttpResponse::Ok().json(AvailableSlotsResponse::from(available)))
}

/// Book a demo slot
///
/// POST /api/v1/booking/schedule-demo
#[instrument(skip(scheduler, req))]
pub async fn schedule_demo(
    scheduler: web::Data<BookingScheduler>,
    req: web::Json<ScheduleDemoRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Schedule request validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let contact_method = req.contact_method()?;
    let req = req.into_inner();

    debug!(
        contractor_id = req.contractor_id,
        slot_id = %req.slot_id,
        "Scheduling demo"
    );

    let booking = scheduler
        .schedule_demo(ScheduleDemo {
            contractor_id: req.contractor_id,
            slot_id: req.slot_id,
            contact_method,
            notes: req.notes,
        })
        .await?;

    info!(booking_id = %booking.id, "Demo scheduled");

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        BookingResponse::from(booking),
        "Demo scheduled successfully",
    )))
}

/// List bookings with pagination and filters
///
/// GET /api/v1/booking/bookings
#[instrument(skip(scheduler))]
pub async fn list_bookings(
    scheduler: web::Data<BookingScheduler>,
    query: web::Query<PaginationParams>,
    filters: web::Query<BookingFilterParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let filter = BookingFilter {
        status: filters.parsed_status()?,
        contractor_id: filters.contractor_id,
    };

    let page = scheduler
        .list_bookings(filter, Some(query.page), Some(query.limit()))
        .await?;

    Ok(HttpResponse::Ok().json(BookingListResponse::from(page)))
}

/// Get a single booking
///
/// GET /api/v1/booking/bookings/{id}
#[instrument(skip(scheduler))]
pub async fn get_booking(
    scheduler: web::Data<BookingScheduler>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let booking = scheduler.get_booking(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(BookingResponse::from(booking)))
}

/// Change a booking's status
///
/// PUT /api/v1/booking/bookings/{id}
#[instrument(skip(scheduler, req))]
pub async fn update_booking(
    scheduler: web::Data<BookingScheduler>,
    path: web::Path<Uuid>,
    req: web::Json<BookingStatusUpdate>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Status update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let id = path.into_inner();
    let status = req.parsed_status()?;

    let booking = scheduler
        .update_status(id, status, req.into_inner().notes)
        .await?;

    Ok(HttpResponse::Ok().json(BookingResponse::from(booking)))
}

/// Cancel a booking
///
/// DELETE /api/v1/booking/bookings/{id}
#[instrument(skip(scheduler))]
pub async fn cancel_booking(
    scheduler: web::Data<BookingScheduler>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    scheduler.cancel(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Booking statistics
///
/// GET /api/v1/booking/stats
#[instrument(skip(scheduler))]
pub async fn get_stats(scheduler: web::Data<BookingScheduler>) -> Result<HttpResponse, AppError> {
    let stats = scheduler.get_stats().await?;
    Ok(HttpResponse::Ok().json(BookingStatsResponse::from(stats)))
}

/// Configure booking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/booking")
            .route("/available-slots", web::get().to(get_available_slots))
            .route("/schedule-demo", web::post().to(schedule_demo))
            .route("/bookings", web::get().to(list_bookings))
            .route("/bookings/{id}", web::get().to(get_booking))
            .route("/bookings/{id}", web::put().to(update_booking))
            .route("/bookings/{id}", web::delete().to(cancel_booking))
            .route("/stats", web::get().to(get_stats)),
    );
}
