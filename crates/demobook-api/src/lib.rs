//! API layer for demobook
//!
//! HTTP handlers and DTOs for demo availability and booking management.

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;

use actix_web::{error::InternalError, web, HttpResponse, ResponseError};
use demobook_core::AppError;

// Re-export DTOs (common types)
pub use dto::{ApiResponse, PaginationParams};

pub use handlers::{configure_booking, configure_health};

/// Mount every API route under `/api/v1`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(configure_health)
            .configure(configure_booking),
    );
}

/// JSON body extractor config reporting failures in the API error format
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = validation_response(&err);
        InternalError::from_response(err, response).into()
    })
}

/// Query string extractor config reporting failures in the API error format
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = validation_response(&err);
        InternalError::from_response(err, response).into()
    })
}

fn validation_response(err: &impl std::fmt::Display) -> HttpResponse {
    AppError::Validation(err.to_string()).error_response()
}
