use super::error::{DbError, DbResult};
use morsel_core::MorselConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Open a connection pool from configuration.
pub async fn connect(config: &MorselConfig) -> DbResult<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| DbError::Unavailable("DATABASE_URL not configured".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await?;

    tracing::info!(max_connections = config.db_max_connections, "Connected to PostgreSQL");
    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    tracing::info!("Running database migrations");
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}
