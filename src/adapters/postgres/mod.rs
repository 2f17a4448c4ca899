//! PostgreSQL adapters - Database implementations for the ledger and sync ports.
//!
//! - `PostgresEventLedger` - Events and their variant details, read and write
//! - `PostgresSyncLogRepository` - Sync session logs
//! - `PostgresConflictRepository` - Conflict resolution records

mod conflict_repository;
mod event_ledger;
mod sync_log_repository;

pub use conflict_repository::PostgresConflictRepository;
pub use event_ledger::PostgresEventLedger;
pub use sync_log_repository::PostgresSyncLogRepository;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::domain::foundation::DomainError;

/// Schema migrations embedded from `migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Builds the connection pool and applies migrations when configured to.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(Some(config.idle_timeout()))
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::database("Failed to connect to database", e))?;

    if config.run_migrations {
        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| DomainError::database("Failed to run migrations", e))?;
        tracing::info!("database migrations applied");
    }

    Ok(pool)
}

/// Decodes one column, mapping failures to `DatabaseError`.
pub(crate) fn column<'r, T>(row: &'r sqlx::postgres::PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    use sqlx::Row;
    row.try_get(name)
        .map_err(|e| DomainError::database(&format!("Failed to decode column '{}'", name), e))
}
