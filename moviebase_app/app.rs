use std::sync::Arc;

use crate::{
    jwt::TokenService,
    repository::{
        MovieRepository, ReviewLikeRepository, ReviewRepository, UserMovieRepository,
        UserRepository,
    },
    services::{MovieService, ReviewLikeService, ReviewService, UserMovieService, UserService},
    tx::TransactionManager,
};

/// Storage backend for the whole application.
#[derive(Clone)]
pub struct Repositories {
    pub movies: Arc<dyn MovieRepository>,
    pub users: Arc<dyn UserRepository>,
    pub user_movies: Arc<dyn UserMovieRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub review_likes: Arc<dyn ReviewLikeRepository>,
}

/// Wires services to their repositories. All services share one
/// [`TransactionManager`], so calls made under the same context compose
/// into a single transaction.
#[derive(Clone)]
pub struct App {
    pub movies: MovieService,
    pub users: UserService,
    pub user_movies: UserMovieService,
    pub reviews: ReviewService,
    pub review_likes: ReviewLikeService,
    tx: TransactionManager,
}

impl App {
    pub fn new(
        repositories: Repositories,
        tx: TransactionManager,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        let Repositories {
            movies,
            users,
            user_movies,
            reviews,
            review_likes,
        } = repositories;

        Self {
            movies: MovieService::new(movies.clone(), tx.clone()),
            users: UserService::new(users, tokens, tx.clone()),
            user_movies: UserMovieService::new(movies.clone(), user_movies, tx.clone()),
            reviews: ReviewService::new(movies, reviews.clone(), tx.clone()),
            review_likes: ReviewLikeService::new(reviews, review_likes, tx.clone()),
            tx,
        }
    }

    /// Manager for callers that group several service calls in one transaction.
    pub fn transactions(&self) -> &TransactionManager {
        &self.tx
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use moviebase_types::{
        Result,
        errors::{ApplicationError, DbError},
        movie::MovieInfo,
        user::RegistrationData,
    };

    use crate::{test_utils::tests::MemoryTransactionSource, tx::TxContext};

    #[tokio::test]
    async fn test_service_calls_compose_into_one_transaction() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        let app = source.app();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        app.transactions()
            .use_transaction(&TxContext::background(), |ctx| {
                let app = app.clone();
                let info = heat.info();
                async move {
                    let user = app
                        .users
                        .register(&ctx, RegistrationData::new("neo", "neo@matrix.io", "redpill"))
                        .await?;
                    let user_id = user.id().unwrap();
                    app.user_movies.save_rating(&ctx, user_id, &info, 7).await?;
                    app.reviews
                        .save_review(&ctx, user_id, &info, "Tense.", date)
                        .await
                }
            })
            .await?;

        assert_eq!(source.begins(), 1);
        assert_eq!(source.commits(), 1);
        let tables = source.snapshot();
        assert_eq!(tables.users.len(), 1);
        assert_eq!(tables.user_movies.len(), 1);
        assert_eq!(tables.reviews.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_late_failure_discards_earlier_writes() {
        let source = MemoryTransactionSource::new();
        let app = source.app();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let result = app
            .transactions()
            .use_transaction(&TxContext::background(), |ctx| {
                let app = app.clone();
                async move {
                    let user = app
                        .users
                        .register(&ctx, RegistrationData::new("neo", "neo@matrix.io", "redpill"))
                        .await?;
                    app.reviews
                        .save_review(
                            &ctx,
                            user.id().unwrap(),
                            &MovieInfo::new("Nonexistent", 2000, 1, 1),
                            "Tense.",
                            date,
                        )
                        .await
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(ApplicationError::Db(DbError::MovieNotFound(_)))
        ));
        assert_eq!(source.begins(), 1);
        assert_eq!(source.rollbacks(), 1);
        assert!(source.snapshot().users.is_empty());
    }
}
