use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument};

use moviebase_types::{
    Result,
    errors::{ApplicationError, DbError},
    movie::MovieInfo,
    review::{Review, ReviewInfo, validate_review_text},
    user::UserId,
};

use crate::{
    repository::{MovieRepository, ReviewRepository},
    tx::{TransactionManager, TxContext},
};

#[derive(Clone)]
pub struct ReviewService {
    movies: Arc<dyn MovieRepository>,
    reviews: Arc<dyn ReviewRepository>,
    tx: TransactionManager,
}

impl ReviewService {
    pub fn new(
        movies: Arc<dyn MovieRepository>,
        reviews: Arc<dyn ReviewRepository>,
        tx: TransactionManager,
    ) -> Self {
        Self {
            movies,
            reviews,
            tx,
        }
    }

    /// Writes the user's review of a movie, replacing the previous one.
    #[instrument(skip_all, fields(user_id = %user_id, title = %info.title))]
    pub async fn save_review(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        info: &MovieInfo,
        text: &str,
        writing_date: NaiveDate,
    ) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                validate_review_text(text)?;

                let movie_id = self.movies.get_id_by_release_date_and_title(&ctx, info).await?;
                let mut review = match self
                    .reviews
                    .get_by_user_and_movie(&ctx, user_id, movie_id)
                    .await
                {
                    Ok(review) => review,
                    Err(ApplicationError::Db(DbError::ReviewNotFound)) => {
                        debug!(movie_id = %movie_id, "no previous review");
                        Review::new(user_id, movie_id)
                    }
                    Err(err) => return Err(err),
                };

                review.set_text(text)?;
                review.set_writing_date(writing_date);
                self.reviews.save(&ctx, &mut review).await
            })
            .await
    }

    #[instrument(skip_all, fields(user_id = %user_id, title = %info.title))]
    pub async fn delete_review(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        info: &MovieInfo,
    ) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                let movie_id = self.movies.get_id_by_release_date_and_title(&ctx, info).await?;
                self.reviews
                    .delete(&ctx, &Review::new(user_id, movie_id))
                    .await
            })
            .await
    }

    /// The user's review of the movie, `None` if they have not written one.
    pub async fn get_user_review(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        info: &MovieInfo,
    ) -> Result<Option<Review>> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let movie_id = self.movies.get_id_by_release_date_and_title(&ctx, info).await?;
                match self
                    .reviews
                    .get_by_user_and_movie(&ctx, user_id, movie_id)
                    .await
                {
                    Ok(review) => Ok(Some(review)),
                    Err(ApplicationError::Db(DbError::ReviewNotFound)) => Ok(None),
                    Err(err) => Err(err),
                }
            })
            .await
    }

    pub async fn get_reviews_by_movie(
        &self,
        ctx: &TxContext,
        info: &MovieInfo,
    ) -> Result<Vec<ReviewInfo>> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let movie_id = self.movies.get_id_by_release_date_and_title(&ctx, info).await?;
                self.reviews.get_reviews_by_movie(&ctx, movie_id).await
            })
            .await
    }

    pub async fn get_reviews_by_movie_for_user(
        &self,
        ctx: &TxContext,
        info: &MovieInfo,
        user_id: UserId,
    ) -> Result<Vec<ReviewInfo>> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let movie_id = self.movies.get_id_by_release_date_and_title(&ctx, info).await?;
                self.reviews
                    .get_reviews_by_movie_for_user(&ctx, movie_id, user_id)
                    .await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use moviebase_types::{
        errors::DomainError,
        user::{AuthenticationData, RegistrationData},
    };

    use super::*;
    use crate::test_utils::tests::{MemoryTransactionSource, TestUser};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_review_for_unknown_movie_leaves_no_trace() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let app = source.app();
        let ctx = TxContext::background();

        app.users
            .register(&ctx, RegistrationData::new("neo", "neo@matrix.io", "redpill"))
            .await?;
        let token = app
            .users
            .authenticate(&ctx, AuthenticationData::new("neo@matrix.io", "redpill"))
            .await?;
        let user_id = app.users.authorize(&token)?;

        let before = (source.commits(), source.rollbacks());
        let result = app
            .reviews
            .save_review(
                &ctx,
                user_id,
                &MovieInfo::new("Nonexistent", 2000, 1, 1),
                "great",
                today(),
            )
            .await;

        assert!(matches!(
            result,
            Err(ApplicationError::Db(DbError::MovieNotFound(_)))
        ));
        assert!(source.snapshot().reviews.is_empty());
        assert_eq!(source.commits(), before.0);
        assert_eq!(source.rollbacks(), before.1 + 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_review_twice_updates_in_place() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        let app = source.app();
        let ctx = TxContext::background();
        let neo = TestUser::register(&app, "neo").await?;

        app.reviews
            .save_review(&ctx, neo.id, &heat.info(), "Tense.", today())
            .await?;
        let first = app.reviews.get_user_review(&ctx, neo.id, &heat.info()).await?.unwrap();

        let later = today().succ_opt().unwrap();
        app.reviews
            .save_review(&ctx, neo.id, &heat.info(), "Tense and long.", later)
            .await?;
        let second = app.reviews.get_user_review(&ctx, neo.id, &heat.info()).await?.unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(second.text(), "Tense and long.");
        assert_eq!(second.writing_date(), later);
        assert_eq!(source.snapshot().reviews.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_text_is_rejected() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        let app = source.app();
        let neo = TestUser::register(&app, "neo").await?;

        let result = app
            .reviews
            .save_review(&TxContext::background(), neo.id, &heat.info(), "", today())
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::ReviewTextInvalid))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_user_review_is_none_until_written_and_after_delete() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        let app = source.app();
        let ctx = TxContext::background();
        let neo = TestUser::register(&app, "neo").await?;

        assert!(app.reviews.get_user_review(&ctx, neo.id, &heat.info()).await?.is_none());

        app.reviews
            .save_review(&ctx, neo.id, &heat.info(), "Tense.", today())
            .await?;
        app.reviews.delete_review(&ctx, neo.id, &heat.info()).await?;
        assert!(app.reviews.get_user_review(&ctx, neo.id, &heat.info()).await?.is_none());

        let again = app.reviews.delete_review(&ctx, neo.id, &heat.info()).await;
        assert!(matches!(
            again,
            Err(ApplicationError::Db(DbError::ReviewNotFound))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_carries_author_rating_and_likes() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        let app = source.app();
        let ctx = TxContext::background();
        let neo = TestUser::register(&app, "neo").await?;
        let trinity = TestUser::register(&app, "trinity").await?;

        app.user_movies.save_rating(&ctx, neo.id, &heat.info(), 9).await?;
        app.reviews
            .save_review(&ctx, neo.id, &heat.info(), "Tense.", today())
            .await?;
        app.reviews
            .save_review(&ctx, trinity.id, &heat.info(), "Long.", today())
            .await?;

        let neo_review = app.reviews.get_user_review(&ctx, neo.id, &heat.info()).await?.unwrap();
        app.review_likes
            .like_review(&ctx, trinity.id, neo_review.id().unwrap())
            .await?;

        let listed = app.reviews.get_reviews_by_movie(&ctx, &heat.info()).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].username, "neo");
        assert_eq!(listed[0].likes, 1);
        assert_eq!(listed[0].user_rating, 9);
        assert_eq!(listed[0].review_year, 2024);
        assert!(!listed[0].is_liked);

        let for_trinity = app
            .reviews
            .get_reviews_by_movie_for_user(&ctx, &heat.info(), trinity.id)
            .await?;
        assert!(for_trinity[0].is_liked);
        assert!(!for_trinity[1].is_liked);
        Ok(())
    }
}
