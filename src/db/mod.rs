//! Postgres pool, embedded migrations and the health check behind `/health`

use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    ConnectionError(String),

    #[error("Failed to run migrations: {0}")]
    MigrationError(String),

    #[error("Database health check failed: {0}")]
    HealthCheckError(String),
}

/// What a successful health check learned about the database
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DbHealth {
    /// Version of the newest applied migration; `None` before the first run
    pub schema_version: Option<i64>,
}

pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    tracing::info!(url = %config.database_url_masked(), "Connecting to ledger database");

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database pool ready"
    );

    Ok(pool)
}

/// Apply the schema under `migrations/`; already-applied versions are skipped
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    let migrator = sqlx::migrate!("./migrations");

    migrator
        .run(pool)
        .await
        .map_err(|e| DbError::MigrationError(e.to_string()))?;

    tracing::info!(
        known = migrator.iter().count(),
        "Ledger schema up to date"
    );

    Ok(())
}

/// Round-trip to the database and report the applied schema version
pub async fn check_health(pool: &PgPool) -> Result<DbHealth, DbError> {
    let has_ledger: bool =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await
            .map_err(|e| DbError::HealthCheckError(e.to_string()))?;

    if !has_ledger {
        return Ok(DbHealth {
            schema_version: None,
        });
    }

    let schema_version: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success")
            .fetch_one(pool)
            .await
            .map_err(|e| DbError::HealthCheckError(e.to_string()))?;

    Ok(DbHealth { schema_version })
}

/// Pool handle shared through application state
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health(&self) -> Result<DbHealth, DbError> {
        check_health(&self.pool).await
    }
}
