//! Demobook server
//!
//! Serves demo availability and booking management over HTTP.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use demobook_api::{configure_routes, json_config, query_config};
use demobook_core::{AppConfig, BookingStore, ContractorDirectory, StorageBackend};
use demobook_db::{
    create_pool, run_migrations, InMemoryBookingStore, InMemoryContractorDirectory,
    PgBookingRepository, PgContractorRepository,
};
use demobook_services::{BookingScheduler, LogNotifier, SystemClock};
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "demobook={0},demobook_api={0},demobook_services={0},demobook_db={0},actix_web=info,sqlx=warn",
            log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

type Stores = (Arc<dyn BookingStore>, Arc<dyn ContractorDirectory>);

/// Build the booking store and contractor directory for the configured backend
async fn build_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("DATABASE_URL (or DEMOBOOK__DATABASE__URL) must be set for the postgres backend")?;

            info!("Connecting to database...");
            let pool = create_pool(url, config.database.max_connections)
                .await
                .context("failed to create database pool")?;

            info!(
                "Database connection established with {} max connections",
                config.database.max_connections
            );

            if config.database.run_migrations {
                run_migrations(&pool)
                    .await
                    .context("failed to apply migrations")?;
            }

            Ok((
                Arc::new(PgBookingRepository::new(pool.clone())),
                Arc::new(PgContractorRepository::new(pool)),
            ))
        }
        StorageBackend::Memory => {
            let contractors = &config.storage.contractors;
            warn!(
                "Using in-memory storage with {} configured contractors; bookings are lost on restart",
                contractors.len()
            );
            if contractors.is_empty() {
                warn!("No contractors under [[storage.contractors]]; every booking request will be rejected");
            }

            Ok((
                Arc::new(InMemoryBookingStore::new()),
                Arc::new(InMemoryContractorDirectory::with_contractors(
                    contractors.iter().cloned(),
                )),
            ))
        }
    }
}

fn build_cors(origins: &[String]) -> Cors {
    let cors = if origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        let origins = origins.to_vec();
        Cors::default().allowed_origin_fn(move |origin, _req_head| {
            origin
                .to_str()
                .map(|o| origins.iter().any(|allowed| allowed.trim() == o))
                .unwrap_or(false)
        })
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Demobook v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().context("failed to load configuration")?;
    let policy = config
        .scheduling
        .validate()
        .context("invalid scheduling configuration")?;

    info!(
        timezone = %policy.timezone(),
        business_hours = %policy.business_hours_label(),
        horizon_days = policy.horizon_days(),
        backend = ?config.storage.backend,
        "Scheduling policy loaded"
    );

    let (store, contractors) = build_stores(&config).await?;

    let scheduler = web::Data::new(BookingScheduler::new(
        store,
        contractors,
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
        policy,
    ));

    let bind_addr = config.server_addr();
    let workers = config.server.workers.max(1);
    let cors_origins = config.server.cors_origins.clone();

    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        App::new()
            .app_data(scheduler.clone())
            .app_data(json_config())
            .app_data(query_config())
            .wrap(build_cors(&cors_origins))
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_routes)
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)
    .with_context(|| format!("failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}
