use moviebase_app::{
    repository::ReviewLikeRepository,
    tx::{TransactionManager, TxContext},
};
use moviebase_types::{Result, errors::DbError, review::ReviewId, user::UserId};

use crate::transaction::PgTransaction;

#[derive(Clone)]
pub struct PostgresReviewLikeRepository {
    tx: TransactionManager,
}

impl PostgresReviewLikeRepository {
    pub fn new(tx: TransactionManager) -> Self {
        Self { tx }
    }
}

#[async_trait::async_trait]
impl ReviewLikeRepository for PostgresReviewLikeRepository {
    async fn like(&self, ctx: &TxContext, user_id: UserId, review_id: ReviewId) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                sqlx::query("INSERT INTO review_likes (user_id, review_id) VALUES ($1, $2)")
                    .bind(user_id.0)
                    .bind(review_id.0)
                    .execute(guard.conn()?)
                    .await?;
                Ok(())
            })
            .await
    }

    async fn unlike(&self, ctx: &TxContext, user_id: UserId, review_id: ReviewId) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let result =
                    sqlx::query("DELETE FROM review_likes WHERE user_id = $1 AND review_id = $2")
                        .bind(user_id.0)
                        .bind(review_id.0)
                        .execute(guard.conn()?)
                        .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::ReviewLikeNotFound.into());
                }
                Ok(())
            })
            .await
    }

    async fn exists(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        review_id: ReviewId,
    ) -> Result<bool> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM review_likes WHERE user_id = $1 AND review_id = $2)",
                )
                .bind(user_id.0)
                .bind(review_id.0)
                .fetch_one(guard.conn()?)
                .await?;
                Ok(exists)
            })
            .await
    }
}
