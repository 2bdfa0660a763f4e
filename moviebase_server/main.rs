use std::sync::Arc;

use moviebase_app::{App, TxContext, config::Config, jwt::JwtTokenService};
use moviebase_db::{DbPool, establish_connection_pool, postgres_repositories};
use moviebase_types::{Result, errors::ApplicationError};

mod logs;
use logs::setup_logging;

#[tokio::main]
#[cfg(not(tarpaulin_include))]
async fn main() -> Result<(), ApplicationError> {
    setup_logging();
    let (pool, app) = setup_app().await?;

    let movies = app.movies.get_all(&TxContext::background()).await?;
    tracing::info!(movies = movies.len(), "moviebase ready");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| ApplicationError::Infrastructure(e.to_string()))?;

    tracing::info!("shutting down");
    pool.close().await;
    Ok(())
}

async fn setup_app() -> Result<(DbPool, App)> {
    let config = Config::from_env()?;
    let db_pool = establish_connection_pool(&config.database).await?;

    sqlx::migrate!("../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| ApplicationError::Unknown(e.to_string()))?;

    let (repositories, tx) = postgres_repositories(db_pool.clone());
    let tokens = Arc::new(JwtTokenService::new(&config.jwt_secret, config.token_ttl));
    let app = App::new(repositories, tx, tokens);

    Ok((db_pool, app))
}
