use moviebase_types::{
    Result,
    movie::MovieId,
    review::{Review, ReviewId, ReviewInfo},
    user::UserId,
};

use crate::tx::TxContext;

/// Listings return at most this many reviews, most liked first.
pub const REVIEWS_PAGE_LIMIT: i64 = 100;

#[async_trait::async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Inserts the review and assigns its id, or updates text and date by id.
    async fn save(&self, ctx: &TxContext, review: &mut Review) -> Result<()>;

    /// Deletes the review the user wrote for the movie.
    async fn delete(&self, ctx: &TxContext, review: &Review) -> Result<()>;

    async fn get_by_user_and_movie(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        movie_id: MovieId,
    ) -> Result<Review>;

    async fn get_by_id(&self, ctx: &TxContext, id: ReviewId) -> Result<Review>;

    async fn get_reviews_by_movie(&self, ctx: &TxContext, movie_id: MovieId)
    -> Result<Vec<ReviewInfo>>;

    /// Like `get_reviews_by_movie`, also telling whether `user_id` liked each review.
    async fn get_reviews_by_movie_for_user(
        &self,
        ctx: &TxContext,
        movie_id: MovieId,
        user_id: UserId,
    ) -> Result<Vec<ReviewInfo>>;
}
