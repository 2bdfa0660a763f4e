use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use moviebase_types::{
    Result,
    errors::AppError,
    user::{User, UserId},
};

/// Issues and checks the bearer tokens handed out on login.
pub trait TokenService: Send + Sync {
    fn generate_token(&self, user: &User) -> Result<String>;

    fn validate_token(&self, token: &str) -> Result<UserId>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

/// HS256 tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user: &User) -> Result<String> {
        let user_id = user.id().ok_or(AppError::Unauthorized)?;
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.0,
            email: user.email.clone(),
            username: user.username.clone(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AppError::from)?;
        Ok(token)
    }

    fn validate_token(&self, token: &str) -> Result<UserId> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|err| {
            tracing::debug!(error = %err, "rejected token");
            AppError::Unauthorized
        })?;
        Ok(UserId(data.claims.user_id))
    }
}

#[cfg(test)]
mod tests {
    use moviebase_types::errors::ApplicationError;

    use super::*;

    fn user() -> User {
        let mut user = User::new("neo".into(), "neo@matrix.io".into(), "hash".into());
        user.set_id(UserId(Uuid::new_v4())).unwrap();
        user
    }

    #[test]
    fn test_token_roundtrip_yields_user_id() {
        let service = JwtTokenService::new("secret", Duration::hours(24));
        let user = user();

        let token = service.generate_token(&user).unwrap();
        assert_eq!(service.validate_token(&token).unwrap(), user.id().unwrap());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtTokenService::new("secret", Duration::hours(24));
        let verifier = JwtTokenService::new("another", Duration::hours(24));
        let token = issuer.generate_token(&user()).unwrap();

        assert!(matches!(
            verifier.validate_token(&token),
            Err(ApplicationError::App(AppError::Unauthorized))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = JwtTokenService::new("secret", Duration::hours(-2));
        let token = service.generate_token(&user()).unwrap();
        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn test_unsaved_user_gets_no_token() {
        let service = JwtTokenService::new("secret", Duration::hours(24));
        let unsaved = User::new("neo".into(), "neo@matrix.io".into(), "hash".into());
        assert!(service.generate_token(&unsaved).is_err());
    }
}
