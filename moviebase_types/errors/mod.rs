use thiserror::Error;

pub mod app_error;
pub mod db_error;
pub mod domain_error;

pub use app_error::AppError;
pub use db_error::DbError;
pub use domain_error::DomainError;

pub type Result<T, E = ApplicationError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[error("An unknown error occurred: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for ApplicationError {
    fn from(err: anyhow::Error) -> Self {
        ApplicationError::Unknown(err.to_string())
    }
}

impl From<sqlx::Error> for ApplicationError {
    fn from(err: sqlx::Error) -> Self {
        ApplicationError::Db(DbError::Database(err))
    }
}

impl ApplicationError {
    /// True for any of the "row does not exist" failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApplicationError::Db(db) if db.is_not_found())
    }
}
