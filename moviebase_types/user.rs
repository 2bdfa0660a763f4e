use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: Option<UserId>,
    pub username: String,
    pub email: String,
    password_hash: String,
}

impl User {
    pub fn new(username: String, email: String, hashed_password: String) -> Self {
        Self {
            id: None,
            username,
            email,
            password_hash: hashed_password,
        }
    }

    pub fn from_parts(id: UserId, username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Some(id),
            username,
            email,
            password_hash,
        }
    }

    pub fn id(&self) -> Option<UserId> {
        self.id
    }

    /// Assigns the storage id. Fails if one was already assigned.
    pub fn set_id(&mut self, id: UserId) -> Result<(), DomainError> {
        if self.id.is_some() {
            return Err(DomainError::IdAlreadyAssigned("user"));
        }
        self.id = Some(id);
        Ok(())
    }

    pub fn password_hash(&self) -> &String {
        &self.password_hash
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationData {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationData {
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthenticationData {
    pub email: String,
    pub password: String,
}

impl AuthenticationData {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_can_be_assigned_once() {
        let mut user = User::new("neo".into(), "neo@matrix.io".into(), "hash".into());
        assert_eq!(user.id(), None);

        let id = UserId(Uuid::new_v4());
        user.set_id(id).unwrap();
        assert_eq!(user.id(), Some(id));

        let again = user.set_id(UserId(Uuid::new_v4()));
        assert!(matches!(again, Err(DomainError::IdAlreadyAssigned("user"))));
        assert_eq!(user.id(), Some(id));
    }
}
