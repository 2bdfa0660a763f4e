use moviebase_types::{Result, review::ReviewId, user::UserId};

use crate::tx::TxContext;

#[async_trait::async_trait]
pub trait ReviewLikeRepository: Send + Sync {
    async fn like(&self, ctx: &TxContext, user_id: UserId, review_id: ReviewId) -> Result<()>;

    async fn unlike(&self, ctx: &TxContext, user_id: UserId, review_id: ReviewId) -> Result<()>;

    async fn exists(&self, ctx: &TxContext, user_id: UserId, review_id: ReviewId)
    -> Result<bool>;
}
