use std::sync::Arc;

use tracing::{debug, instrument};

use moviebase_types::{
    Result,
    errors::{ApplicationError, DbError},
    movie::{MovieId, MovieInfo},
    user::UserId,
    user_movie::{ListType, MovieUserInfo, UserMovie},
};

use crate::{
    repository::{MovieRepository, UserMovieRepository},
    tx::{TransactionManager, TxContext},
};

#[derive(Clone)]
pub struct UserMovieService {
    movies: Arc<dyn MovieRepository>,
    user_movies: Arc<dyn UserMovieRepository>,
    tx: TransactionManager,
}

impl UserMovieService {
    pub fn new(
        movies: Arc<dyn MovieRepository>,
        user_movies: Arc<dyn UserMovieRepository>,
        tx: TransactionManager,
    ) -> Self {
        Self {
            movies,
            user_movies,
            tx,
        }
    }

    #[instrument(skip_all, fields(user_id = %user_id, title = %info.title, rating = rating))]
    pub async fn save_rating(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        info: &MovieInfo,
        rating: i32,
    ) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                let movie_id = self.movies.get_id_by_release_date_and_title(&ctx, info).await?;
                let mut user_movie = self.load_or_new(&ctx, user_id, movie_id).await?;
                user_movie.set_rating(rating)?;
                self.persist(&ctx, &mut user_movie).await?;
                debug!("user movie rating saved");
                Ok(())
            })
            .await
    }

    /// Moves the movie into `list_type` ("favorite", "watchlist" or "" to
    /// remove it from any list).
    #[instrument(skip_all, fields(user_id = %user_id, title = %info.title, list_type = %list_type))]
    pub async fn save_list_type(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        info: &MovieInfo,
        list_type: &str,
    ) -> Result<()> {
        let list_type = ListType::parse(list_type)?;
        self.tx
            .use_transaction(ctx, |ctx| async move {
                let movie_id = self.movies.get_id_by_release_date_and_title(&ctx, info).await?;
                let mut user_movie = self.load_or_new(&ctx, user_id, movie_id).await?;
                user_movie.set_list_type(list_type);
                self.persist(&ctx, &mut user_movie).await?;
                debug!("user movie list type saved");
                Ok(())
            })
            .await
    }

    pub async fn find_movie_by_user(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        info: &MovieInfo,
        list_type: &str,
    ) -> Result<MovieUserInfo> {
        let list_type = ListType::parse(list_type)?;
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let movie_id = self.movies.get_id_by_release_date_and_title(&ctx, info).await?;
                self.user_movies
                    .get_movie_by_user_and_list_type(&ctx, user_id, movie_id, list_type)
                    .await
            })
            .await
    }

    pub async fn find_movies_by_user_and_list_type(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        list_type: &str,
    ) -> Result<Vec<MovieUserInfo>> {
        let list_type = ListType::parse(list_type)?;
        self.tx
            .in_transaction(ctx, |ctx| async move {
                self.user_movies
                    .get_movies_by_user_and_list_type(&ctx, user_id, list_type)
                    .await
            })
            .await
    }

    async fn load_or_new(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        movie_id: MovieId,
    ) -> Result<UserMovie> {
        match self
            .user_movies
            .get_by_user_and_movie(ctx, user_id, movie_id)
            .await
        {
            Ok(user_movie) => Ok(user_movie),
            Err(ApplicationError::Db(DbError::UserMovieNotFound)) => {
                Ok(UserMovie::new(user_id, movie_id))
            }
            Err(err) => Err(err),
        }
    }

    /// A stored row with nothing left in it is deleted instead of updated.
    async fn persist(&self, ctx: &TxContext, user_movie: &mut UserMovie) -> Result<()> {
        if user_movie.id().is_some() && user_movie.is_empty() {
            self.user_movies.delete(ctx, user_movie).await
        } else {
            self.user_movies.save(ctx, user_movie).await
        }
    }
}

#[cfg(test)]
mod tests {
    use moviebase_types::errors::DomainError;

    use super::*;
    use crate::test_utils::tests::{MemoryTransactionSource, TestUser};

    #[tokio::test]
    async fn test_rating_feeds_movie_average() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        let app = source.app();
        let ctx = TxContext::background();
        let neo = TestUser::register(&app, "neo").await?;
        let trinity = TestUser::register(&app, "trinity").await?;

        app.user_movies.save_rating(&ctx, neo.id, &heat.info(), 8).await?;
        app.user_movies.save_rating(&ctx, trinity.id, &heat.info(), 5).await?;

        let movie = app.movies.find_by_release_date_and_title(&ctx, &heat.info()).await?;
        assert_eq!(movie.rating, 6.5);

        let out_of_range = app.user_movies.save_rating(&ctx, neo.id, &heat.info(), 11).await;
        assert!(matches!(
            out_of_range,
            Err(ApplicationError::Domain(DomainError::RatingOutOfRange(11)))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_list_type_opens_no_transaction() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        let app = source.app();
        let neo = TestUser::register(&app, "neo").await?;
        let begins = source.begins();

        let result = app
            .user_movies
            .save_list_type(&TxContext::background(), neo.id, &heat.info(), "seen")
            .await;

        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::InvalidListType(_)))
        ));
        assert_eq!(source.begins(), begins);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_type_roundtrip_and_empty_row_is_deleted() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        source.seed_movie("Alien", 1979, 5, 25);
        let app = source.app();
        let ctx = TxContext::background();
        let neo = TestUser::register(&app, "neo").await?;

        app.user_movies
            .save_list_type(&ctx, neo.id, &heat.info(), "favorite")
            .await?;

        let favorites = app
            .user_movies
            .find_movies_by_user_and_list_type(&ctx, neo.id, "favorite")
            .await?;
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].title, "Heat");
        assert_eq!(favorites[0].list_type, ListType::Favorite);

        let found = app
            .user_movies
            .find_movie_by_user(&ctx, neo.id, &heat.info(), "favorite")
            .await?;
        assert_eq!(found.user_rating, 0);

        let unlisted = app
            .user_movies
            .find_movies_by_user_and_list_type(&ctx, neo.id, "")
            .await?;
        assert_eq!(unlisted.len(), 1);
        assert_eq!(unlisted[0].title, "Alien");

        app.user_movies
            .save_list_type(&ctx, neo.id, &heat.info(), "")
            .await?;
        assert!(source.snapshot().user_movies.is_empty());

        let gone = app
            .user_movies
            .find_movie_by_user(&ctx, neo.id, &heat.info(), "favorite")
            .await;
        assert!(matches!(
            gone,
            Err(ApplicationError::Db(DbError::UserMovieNotFound))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_rating_survives_list_removal() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        let app = source.app();
        let ctx = TxContext::background();
        let neo = TestUser::register(&app, "neo").await?;

        app.user_movies.save_rating(&ctx, neo.id, &heat.info(), 9).await?;
        app.user_movies
            .save_list_type(&ctx, neo.id, &heat.info(), "watchlist")
            .await?;
        app.user_movies
            .save_list_type(&ctx, neo.id, &heat.info(), "")
            .await?;

        let rows = source.snapshot().user_movies;
        assert_eq!(rows.len(), 1);
        let row = rows.values().next().unwrap();
        assert_eq!(row.user_rating(), 9);
        assert_eq!(row.list_type(), ListType::None);
        Ok(())
    }
}
