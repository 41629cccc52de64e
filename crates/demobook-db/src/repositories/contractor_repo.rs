//! Contractor directory backed by PostgreSQL

use demobook_core::{models::Contractor, traits::ContractorDirectory, AppError, AppResult};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of ContractorDirectory
pub struct PgContractorRepository {
    pool: PgPool,
}

impl PgContractorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a contractor. Used for seeding; the scheduler never writes contractors.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        email: &str,
        company_name: &str,
        contact_name: Option<&str>,
    ) -> AppResult<Contractor> {
        let row = sqlx::query_as::<sqlx::Postgres, ContractorRow>(
            r#"
            INSERT INTO contractors (email, company_name, contact_name)
            VALUES ($1, $2, $3)
            RETURNING id, email, company_name, contact_name
            "#,
        )
        .bind(email)
        .bind(company_name)
        .bind(contact_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating contractor: {}", e);
            AppError::Database(format!("Failed to create contractor: {}", e))
        })?;

        Ok(row.into())
    }
}

#[async_trait]
impl ContractorDirectory for PgContractorRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Contractor>> {
        debug!("Finding contractor by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, ContractorRow>(
            "SELECT id, email, company_name, contact_name FROM contractors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding contractor {}: {}", id, e);
            AppError::Database(format!("Failed to find contractor: {}", e))
        })?;

        Ok(result.map(Into::into))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ContractorRow {
    id: i32,
    email: String,
    company_name: String,
    contact_name: Option<String>,
}

impl From<ContractorRow> for Contractor {
    fn from(row: ContractorRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            company_name: row.company_name,
            contact_name: row.contact_name,
        }
    }
}
