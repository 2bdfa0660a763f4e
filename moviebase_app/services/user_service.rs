use std::sync::Arc;

use tracing::{debug, error, instrument};

use moviebase_types::{
    Result,
    errors::AppError,
    user::{AuthenticationData, RegistrationData, User, UserId},
};

use crate::{
    auth::{hash_password, verify_password},
    jwt::TokenService,
    repository::UserRepository,
    tx::{TransactionManager, TxContext},
    validation::{validate_authentication, validate_registration},
};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenService>,
    tx: TransactionManager,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenService>,
        tx: TransactionManager,
    ) -> Self {
        Self { users, tokens, tx }
    }

    pub async fn get_user_by_id(&self, ctx: &TxContext, id: UserId) -> Result<User> {
        self.tx
            .in_transaction(ctx, |ctx| async move { self.users.get_by_id(&ctx, id).await })
            .await
    }

    /// Creates an account. The email must not be taken yet.
    #[instrument(skip_all, fields(email = %data.email))]
    pub async fn register(&self, ctx: &TxContext, data: RegistrationData) -> Result<User> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                validate_registration(&data)?;

                if self.users.exists_by_email(&ctx, &data.email).await? {
                    return Err(AppError::EmailAlreadyExists(data.email).into());
                }

                let password_hash = hash_password(&data.password)?;
                let mut user = User::new(data.username, data.email, password_hash);
                if let Err(err) = self.users.save(&ctx, &mut user).await {
                    error!(error = %err, "failed to save user");
                    return Err(AppError::RegistrationFailed.into());
                }

                debug!(user_id = ?user.id(), "user registered");
                Ok(user)
            })
            .await
    }

    /// Checks credentials and returns a signed access token.
    #[instrument(skip_all, fields(email = %data.email))]
    pub async fn authenticate(&self, ctx: &TxContext, data: AuthenticationData) -> Result<String> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                validate_authentication(&data)?;

                let user = self.users.get_by_email(&ctx, &data.email).await?;
                verify_password(user.password_hash(), &data.password)?;

                self.tokens.generate_token(&user)
            })
            .await
    }

    /// Resolves a bearer token to the user it was issued for.
    pub fn authorize(&self, token: &str) -> Result<UserId> {
        self.tokens.validate_token(token)
    }
}

#[cfg(test)]
mod tests {
    use moviebase_types::errors::{ApplicationError, DbError, DomainError};

    use super::*;
    use crate::test_utils::tests::MemoryTransactionSource;

    #[tokio::test]
    async fn test_register_then_authenticate() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let app = source.app();
        let ctx = TxContext::background();

        let user = app
            .users
            .register(&ctx, RegistrationData::new("neo", "neo@matrix.io", "redpill"))
            .await?;
        let user_id = user.id().unwrap();
        assert_ne!(user.password_hash(), "redpill");

        let token = app
            .users
            .authenticate(&ctx, AuthenticationData::new("neo@matrix.io", "redpill"))
            .await?;
        assert_eq!(app.users.authorize(&token)?, user_id);

        let fetched = app.users.get_user_by_id(&ctx, user_id).await?;
        assert_eq!(fetched.username, "neo");
        assert_eq!(source.commits(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let app = source.app();
        let ctx = TxContext::background();

        app.users
            .register(&ctx, RegistrationData::new("neo", "neo@matrix.io", "redpill"))
            .await?;
        let again = app
            .users
            .register(&ctx, RegistrationData::new("smith", "neo@matrix.io", "bluepill"))
            .await;

        assert!(matches!(
            again,
            Err(ApplicationError::App(AppError::EmailAlreadyExists(_)))
        ));
        assert_eq!(source.snapshot().users.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_validates_before_touching_storage() {
        let source = MemoryTransactionSource::new();
        let app = source.app();

        let result = app
            .users
            .register(
                &TxContext::background(),
                RegistrationData::new("neo", "not-an-email", "redpill"),
            )
            .await;

        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::EmailInvalid))
        ));
        assert!(source.snapshot().users.is_empty());
        assert_eq!(source.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_authenticate_with_wrong_password() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let app = source.app();
        let ctx = TxContext::background();
        app.users
            .register(&ctx, RegistrationData::new("neo", "neo@matrix.io", "redpill"))
            .await?;

        let wrong = app
            .users
            .authenticate(&ctx, AuthenticationData::new("neo@matrix.io", "bluepill"))
            .await;
        assert!(matches!(
            wrong,
            Err(ApplicationError::App(AppError::WrongAuthCredentials))
        ));

        let unknown = app
            .users
            .authenticate(&ctx, AuthenticationData::new("smith@matrix.io", "redpill"))
            .await;
        assert!(matches!(
            unknown,
            Err(ApplicationError::Db(DbError::UserByEmailNotFound(_)))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_authorize_rejects_garbage() {
        let source = MemoryTransactionSource::new();
        let app = source.app();
        assert!(matches!(
            app.users.authorize("not.a.token"),
            Err(ApplicationError::App(AppError::Unauthorized))
        ));
    }
}
