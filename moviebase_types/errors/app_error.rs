use thiserror::Error;

/// Errors for app logic (auth, registration, configuration).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Wrong authentication credentials")]
    WrongAuthCredentials,

    #[error("User email '{0}' already exists")]
    EmailAlreadyExists(String),

    #[error("Failed to register user")]
    RegistrationFailed,

    #[error("Failed to authorize user")]
    Unauthorized,

    #[error(transparent)]
    PasswordHash(#[from] password_hash::Error),

    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("You need to set env {0}")]
    MissingConfig(&'static str),

    #[error("Invalid value for env {0}")]
    InvalidConfig(&'static str),
}
