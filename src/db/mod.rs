//! Database connection management

pub mod schema;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::DatabaseConfig;

/// PostgreSQL connection pool, sized from the `database` config section.
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open a pool against the configured database.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
            .connect(&cfg.url)
            .await?;

        tracing::info!(
            max_connections = cfg.max_connections,
            acquire_timeout_secs = cfg.acquire_timeout_secs,
            "PostgreSQL pool ready"
        );
        Ok(Self { pool })
    }

    /// Wrap an already-built pool (used by tests)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Readiness probe: the pool must answer and the ledger schema must be
    /// in place. Probing the transactions table (rather than a bare
    /// `SELECT 1`) makes /health fail on a database that was never
    /// initialized.
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT id FROM transactions LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(())
    }
}
