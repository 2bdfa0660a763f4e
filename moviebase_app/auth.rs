use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use moviebase_types::{Result, errors::AppError};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hashed = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hashed)
}

/// Checks `password` against a stored PHC hash. A mismatch is reported as
/// wrong credentials, a malformed hash as a hashing error.
pub fn verify_password(hash: &str, password: &str) -> Result<(), AppError> {
    let parsed_hash = PasswordHash::new(hash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|err| match err {
            argon2::password_hash::Error::Password => AppError::WrongAuthCredentials,
            other => AppError::PasswordHash(other),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert_ne!(hash, "s3cret");
        assert!(verify_password(&hash, "s3cret").is_ok());
        assert!(matches!(
            verify_password(&hash, "wrong"),
            Err(AppError::WrongAuthCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("not-a-phc-string", "pw"),
            Err(AppError::PasswordHash(_))
        ));
    }
}
