//! Input checks for registration and login.

use moviebase_types::{
    errors::DomainError,
    user::{AuthenticationData, RegistrationData},
};

const MAX_FIELD_LEN: usize = 30;

pub fn validate_username(username: &str) -> Result<(), DomainError> {
    if username.is_empty() || username.len() >= MAX_FIELD_LEN {
        return Err(DomainError::UsernameInvalid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.is_empty() || password.len() >= MAX_FIELD_LEN {
        return Err(DomainError::PasswordInvalid);
    }
    Ok(())
}

/// Accepts `local@domain` addresses of at most 30 bytes.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    if email.len() > MAX_FIELD_LEN || email.chars().any(char::is_whitespace) {
        return Err(DomainError::EmailInvalid);
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.') =>
        {
            Ok(())
        }
        _ => Err(DomainError::EmailInvalid),
    }
}

pub fn validate_registration(data: &RegistrationData) -> Result<(), DomainError> {
    validate_username(&data.username)?;
    validate_email(&data.email)?;
    validate_password(&data.password)
}

pub fn validate_authentication(data: &AuthenticationData) -> Result<(), DomainError> {
    validate_email(&data.email)?;
    validate_password(&data.password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("neo@matrix.io").is_ok());
        assert!(validate_email("a@b").is_ok());
        for bad in ["", "neo", "@matrix.io", "neo@", "ne o@matrix.io", "a@b@c", "neo@.io"] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
        let long = format!("{}@example.com", "x".repeat(20));
        assert!(matches!(validate_email(&long), Err(DomainError::EmailInvalid)));
    }

    #[test]
    fn test_username_and_password_lengths() {
        assert!(validate_username("neo").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"n".repeat(29)).is_ok());
        assert!(validate_username(&"n".repeat(30)).is_err());
        assert!(matches!(validate_password(""), Err(DomainError::PasswordInvalid)));
    }

    #[test]
    fn test_registration_checks_fields_in_order() {
        let data = RegistrationData::new("", "bad", "");
        assert!(matches!(
            validate_registration(&data),
            Err(DomainError::UsernameInvalid)
        ));
        let data = RegistrationData::new("neo", "bad", "");
        assert!(matches!(
            validate_registration(&data),
            Err(DomainError::EmailInvalid)
        ));
    }
}
