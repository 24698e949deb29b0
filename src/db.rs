use crate::constants;
use crate::domain::Admission;
use crate::error::{EtlError, Result};
use crate::storage::AdmissionStore;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Postgres-backed implementation of [`AdmissionStore`]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to Postgres using the configured URL
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to Postgres");

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| EtlError::Store {
                message: format!("Failed to connect to database: {e}"),
            })?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../migrations/001_create_hospital_admissions.sql");

        sqlx::raw_sql(migration_sql)
            .execute(&self.pool)
            .await
            .map_err(|e| EtlError::Store {
                message: format!("Failed to run migrations: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl AdmissionStore for PostgresStore {
    async fn table_exists(&self) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1)",
        )
        .bind(constants::ADMISSIONS_TABLE)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_admission(&self, admission: &Admission) -> Result<()> {
        // Single-row autocommit insert: a rejected row must never roll back
        // rows that were already accepted.
        sqlx::query(
            "INSERT INTO hospital_admissions \
             (patient_id, admission_date, discharge_date, diagnosis, department) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&admission.patient_id)
        .bind(admission.admission_date)
        .bind(admission.discharge_date)
        .bind(&admission.diagnosis)
        .bind(&admission.department)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
