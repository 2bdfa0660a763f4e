use sqlx::postgres::{PgPool, PgPoolOptions};
use std::env;

use moviebase_app::config::DatabaseConfig;
use moviebase_types::errors::{AppError, ApplicationError, DbError};

pub type DbPool = PgPool;

pub async fn establish_connection_pool(config: &DatabaseConfig) -> Result<DbPool, DbError> {
    tracing::debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "opening connection pool"
    );

    Ok(PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect(&config.url)
        .await?)
}

/// Small pool on `TEST_DATABASE_URL`, used by the integration tests.
pub async fn establish_test_connection_pool() -> Result<DbPool, ApplicationError> {
    dotenvy::dotenv().ok();

    let database_url =
        env::var("TEST_DATABASE_URL").map_err(|_| AppError::MissingConfig("TEST_DATABASE_URL"))?;

    Ok(PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?)
}
