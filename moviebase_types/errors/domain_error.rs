use thiserror::Error;

/// Errors for domain rules (validation, entity invariants).
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Review text validation error")]
    ReviewTextInvalid,

    #[error("Rating must be between 0 and 10, got {0}")]
    RatingOutOfRange(i32),

    #[error("List type '{0}' is incorrect")]
    InvalidListType(String),

    #[error("User name validation failed")]
    UsernameInvalid,

    #[error("User email validation failed")]
    EmailInvalid,

    #[error("User password validation failed")]
    PasswordInvalid,

    #[error("Invalid release date {year}-{month}-{day}")]
    InvalidReleaseDate { year: i32, month: u32, day: u32 },

    #[error("{0} id already assigned")]
    IdAlreadyAssigned(&'static str),

    #[error("Review like already exists")]
    ReviewLikeAlreadyExists,
}
