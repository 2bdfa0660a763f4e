use dotenvy::dotenv;
use std::{env, str::FromStr, time::Duration};

use moviebase_types::errors::AppError;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub database: DatabaseConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let jwt_secret = required("MOVIEBASE_JWT_SECRET")?;
        let token_ttl = chrono::Duration::hours(parsed("MOVIEBASE_TOKEN_TTL_HOURS", 24)?);

        let database = DatabaseConfig {
            url: required("DATABASE_URL")?,
            max_connections: parsed("MOVIEBASE_DB_MAX_CONNECTIONS", 5)?,
            min_connections: parsed("MOVIEBASE_DB_MIN_CONNECTIONS", 0)?,
            acquire_timeout: Duration::from_secs(parsed("MOVIEBASE_DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            idle_timeout: Duration::from_secs(parsed("MOVIEBASE_DB_IDLE_TIMEOUT_SECS", 600)?),
            max_lifetime: Duration::from_secs(parsed("MOVIEBASE_DB_MAX_LIFETIME_SECS", 1800)?),
        };

        Ok(Self {
            jwt_secret,
            token_ttl,
            database,
        })
    }
}

fn required(key: &'static str) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(AppError::MissingConfig(key)),
    }
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(val) => val.parse::<T>().map_err(|_| AppError::InvalidConfig(key)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_falls_back_to_default() {
        let value: u32 = parsed("MOVIEBASE_TEST_SURELY_UNSET", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_required_reports_the_missing_key() {
        assert!(matches!(
            required("MOVIEBASE_TEST_SURELY_UNSET"),
            Err(AppError::MissingConfig("MOVIEBASE_TEST_SURELY_UNSET"))
        ));
    }
}
