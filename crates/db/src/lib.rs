//! Persistence layer for the Cascade project service.
//!
//! Exposes the connection pool helpers, the entity models, and the
//! repositories. Repositories that enforce domain guards (default-role
//! protection, last-manager rule, lifecycle preconditions) return [`DbError`],
//! which carries either the domain error or the underlying database failure.

use sqlx::postgres::PgPoolOptions;

use cascade_core::error::CoreError;

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Error type for repository operations that apply domain guards.
///
/// Guard failures are discovered inside transactions, so they surface here
/// rather than at the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
