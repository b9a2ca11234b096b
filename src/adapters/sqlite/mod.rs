//! SQLite adapters for the profiling service's repository ports.

pub mod connection;
pub mod expertise_area_repository;
pub mod migrations;
pub mod profile_repository;
pub mod publisher_statistics_repository;
pub mod session_repository;
pub mod statistics_repository;

pub use connection::{create_pool, create_test_pool, verify_connection, ConnectionError, PoolConfig};
pub use expertise_area_repository::SqliteExpertiseAreaRepository;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use profile_repository::SqliteProfileRepository;
pub use publisher_statistics_repository::SqlitePublisherStatisticsRepository;
pub use session_repository::SqliteSessionRepository;
pub use statistics_repository::SqliteStatisticsRepository;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DatabaseConfig;

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an optional RFC3339 datetime string from a SQLite row field.
pub fn parse_optional_datetime(s: Option<String>) -> DomainResult<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_datetime).transpose()
}

/// Parse a JSON string from a SQLite row field, falling back to the type's default.
pub fn parse_json_or_default<T: serde::de::DeserializeOwned + Default>(s: Option<String>) -> DomainResult<T> {
    s.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|opt| opt.unwrap_or_default())
}

/// Narrow a stored INTEGER level to the domain's `u32`.
pub fn parse_level(value: i64) -> DomainResult<u32> {
    u32::try_from(value)
        .map_err(|_| DomainError::SerializationError(format!("invalid expertise level: {value}")))
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

pub async fn initialize_database(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(&config.url(), Some(PoolConfig::from(config))).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}
