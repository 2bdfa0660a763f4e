use thiserror::Error;
use uuid::Uuid;

/// Errors for db stuff.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Movie '{0}' not found")]
    MovieNotFound(String),

    #[error("User with email '{0}' not found")]
    UserByEmailNotFound(String),

    #[error("User with ID {0} not found")]
    UserByIdNotFound(Uuid),

    #[error("Review not found")]
    ReviewNotFound,

    #[error("Review with ID {0} not found")]
    ReviewByIdNotFound(Uuid),

    #[error("User movie not found")]
    UserMovieNotFound,

    #[error("Review like not found")]
    ReviewLikeNotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Deadline exceeded while running the unit of work")]
    DeadlineExceeded,
}

impl DbError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DbError::MovieNotFound(_)
                | DbError::UserByEmailNotFound(_)
                | DbError::UserByIdNotFound(_)
                | DbError::ReviewNotFound
                | DbError::ReviewByIdNotFound(_)
                | DbError::UserMovieNotFound
                | DbError::ReviewLikeNotFound
        )
    }
}
