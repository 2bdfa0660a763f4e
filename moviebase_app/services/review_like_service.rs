use std::sync::Arc;

use tracing::{error, instrument};

use moviebase_types::{
    Result,
    errors::{DbError, DomainError},
    review::ReviewId,
    user::UserId,
};

use crate::{
    repository::{ReviewLikeRepository, ReviewRepository},
    tx::{TransactionManager, TxContext},
};

#[derive(Clone)]
pub struct ReviewLikeService {
    reviews: Arc<dyn ReviewRepository>,
    review_likes: Arc<dyn ReviewLikeRepository>,
    tx: TransactionManager,
}

impl ReviewLikeService {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        review_likes: Arc<dyn ReviewLikeRepository>,
        tx: TransactionManager,
    ) -> Self {
        Self {
            reviews,
            review_likes,
            tx,
        }
    }

    #[instrument(skip_all, fields(user_id = %user_id, review_id = %review_id))]
    pub async fn like_review(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        review_id: ReviewId,
    ) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                self.reviews.get_by_id(&ctx, review_id).await?;

                if self.review_likes.exists(&ctx, user_id, review_id).await? {
                    error!("review already liked");
                    return Err(DomainError::ReviewLikeAlreadyExists.into());
                }

                self.review_likes.like(&ctx, user_id, review_id).await
            })
            .await
    }

    #[instrument(skip_all, fields(user_id = %user_id, review_id = %review_id))]
    pub async fn unlike_review(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        review_id: ReviewId,
    ) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                self.reviews.get_by_id(&ctx, review_id).await?;

                if !self.review_likes.exists(&ctx, user_id, review_id).await? {
                    error!("review like does not exist");
                    return Err(DbError::ReviewLikeNotFound.into());
                }

                self.review_likes.unlike(&ctx, user_id, review_id).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use moviebase_types::errors::ApplicationError;

    use super::*;
    use crate::test_utils::tests::{MemoryTransactionSource, TestUser};

    #[tokio::test]
    async fn test_like_then_unlike() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        let app = source.app();
        let ctx = TxContext::background();
        let neo = TestUser::register(&app, "neo").await?;
        let trinity = TestUser::register(&app, "trinity").await?;

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        app.reviews
            .save_review(&ctx, neo.id, &heat.info(), "Tense.", date)
            .await?;
        let review_id = app
            .reviews
            .get_user_review(&ctx, neo.id, &heat.info())
            .await?
            .and_then(|r| r.id())
            .unwrap();

        app.review_likes.like_review(&ctx, trinity.id, review_id).await?;
        let twice = app.review_likes.like_review(&ctx, trinity.id, review_id).await;
        assert!(matches!(
            twice,
            Err(ApplicationError::Domain(DomainError::ReviewLikeAlreadyExists))
        ));
        assert_eq!(source.snapshot().review_likes.len(), 1);

        app.review_likes.unlike_review(&ctx, trinity.id, review_id).await?;
        let again = app.review_likes.unlike_review(&ctx, trinity.id, review_id).await;
        assert!(matches!(
            again,
            Err(ApplicationError::Db(DbError::ReviewLikeNotFound))
        ));
        assert!(source.snapshot().review_likes.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_like_unknown_review() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let app = source.app();
        let neo = TestUser::register(&app, "neo").await?;
        let missing = ReviewId(Uuid::new_v4());

        let result = app
            .review_likes
            .like_review(&TxContext::background(), neo.id, missing)
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Db(DbError::ReviewByIdNotFound(id))) if id == missing.0
        ));
        Ok(())
    }
}
