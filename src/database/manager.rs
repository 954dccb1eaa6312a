use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

/// Errors from the database layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Database not initialized")]
    NotInitialized,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

static POOL: OnceLock<PgPool> = OnceLock::new();

/// Owns the process-wide connection pool and runs embedded migrations once
/// at startup.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect and migrate. Called once from main before serving traffic;
    /// a failure here is fatal.
    pub async fn init(database_url: &str) -> Result<(), DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

        let _ = POOL.set(pool);
        info!("database pool ready");
        Ok(())
    }

    pub fn pool() -> Result<PgPool, DatabaseError> {
        POOL.get().cloned().ok_or(DatabaseError::NotInitialized)
    }
}
