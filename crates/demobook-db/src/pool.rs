//! PostgreSQL connection pool and schema migrations

use demobook_core::{AppError, AppResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{error, info, warn};

/// How long a request waits for a free connection before failing
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle connections are closed after this long
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Pool options for the booking store. A zero size is raised to one.
fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(Some(IDLE_TIMEOUT))
        .test_before_acquire(true)
}

/// Connect to PostgreSQL with at most `max_connections` connections
/// (`database.max_connections` in the application config).
///
/// ```no_run
/// # async fn run() -> demobook_db::AppResult<()> {
/// let pool = demobook_db::create_pool("postgresql://localhost/demobook", 10).await?;
/// # Ok(())
/// # }
/// ```
pub async fn create_pool(database_url: &str, max_connections: u32) -> AppResult<PgPool> {
    let options = pool_options(max_connections);
    let size = options.get_max_connections();

    let pool = options.connect(database_url).await.map_err(|e| {
        warn!("Failed to connect to the booking database: {}", e);
        AppError::Pool(format!("Failed to connect to database: {}", e))
    })?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| AppError::Database(format!("Database health check failed: {}", e)))?;

    info!(max_connections = size, "Booking database pool ready");
    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            error!("Migration failed: {}", e);
            AppError::Database(format!("Failed to run migrations: {}", e))
        })?;

    info!("Database migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_options_follow_configured_size() {
        let options = pool_options(25);
        assert_eq!(options.get_max_connections(), 25);
        assert_eq!(options.get_acquire_timeout(), ACQUIRE_TIMEOUT);
        assert_eq!(options.get_idle_timeout(), Some(IDLE_TIMEOUT));
    }

    #[test]
    fn test_pool_options_never_empty() {
        assert_eq!(pool_options(0).get_max_connections(), 1);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_create_pool_and_migrate() {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/demobook".to_string());

        let pool = create_pool(&database_url, 5).await.unwrap();
        assert!(run_migrations(&pool).await.is_ok());
    }
}
