use uuid::Uuid;

use moviebase_app::{
    repository::UserRepository,
    tx::{TransactionManager, TxContext},
};
use moviebase_types::{
    Result,
    errors::DbError,
    user::{User, UserId},
};

use crate::{models as db_models, transaction::PgTransaction};

#[derive(Clone)]
pub struct PostgresUserRepository {
    tx: TransactionManager,
}

impl PostgresUserRepository {
    pub fn new(tx: TransactionManager) -> Self {
        Self { tx }
    }
}

#[async_trait::async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_by_id(&self, ctx: &TxContext, id: UserId) -> Result<User> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let row: Option<db_models::User> = sqlx::query_as(
                    r#"
                    SELECT id, username, email, password_hash
                    FROM users
                    WHERE id = $1
                    "#,
                )
                .bind(id.0)
                .fetch_optional(guard.conn()?)
                .await?;

                row.map(Into::into)
                    .ok_or_else(|| DbError::UserByIdNotFound(id.0).into())
            })
            .await
    }

    async fn get_by_email(&self, ctx: &TxContext, email: &str) -> Result<User> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let row: Option<db_models::User> = sqlx::query_as(
                    r#"
                    SELECT id, username, email, password_hash
                    FROM users
                    WHERE email = $1
                    "#,
                )
                .bind(email)
                .fetch_optional(guard.conn()?)
                .await?;

                row.map(Into::into)
                    .ok_or_else(|| DbError::UserByEmailNotFound(email.to_string()).into())
            })
            .await
    }

    async fn save(&self, ctx: &TxContext, user: &mut User) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;

                match user.id() {
                    None => {
                        let id: Uuid = sqlx::query_scalar(
                            r#"
                            INSERT INTO users (username, email, password_hash)
                            VALUES ($1, $2, $3)
                            RETURNING id
                            "#,
                        )
                        .bind(&user.username)
                        .bind(&user.email)
                        .bind(user.password_hash())
                        .fetch_one(guard.conn()?)
                        .await?;
                        user.set_id(UserId(id))?;
                    }
                    Some(id) => {
                        let result = sqlx::query(
                            r#"
                            UPDATE users
                            SET username = $1, email = $2, password_hash = $3
                            WHERE id = $4
                            "#,
                        )
                        .bind(&user.username)
                        .bind(&user.email)
                        .bind(user.password_hash())
                        .bind(id.0)
                        .execute(guard.conn()?)
                        .await?;

                        if result.rows_affected() == 0 {
                            return Err(DbError::UserByIdNotFound(id.0).into());
                        }
                    }
                }

                Ok(())
            })
            .await
    }

    async fn exists_by_email(&self, ctx: &TxContext, email: &str) -> Result<bool> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                        .bind(email)
                        .fetch_one(guard.conn()?)
                        .await?;
                Ok(exists)
            })
            .await
    }
}
