use std::sync::Arc;

use tracing::instrument;

use moviebase_types::{
    Result,
    movie::{Movie, MovieInfo},
};

use crate::{
    repository::MovieRepository,
    tx::{TransactionManager, TxContext},
};

#[derive(Clone)]
pub struct MovieService {
    movies: Arc<dyn MovieRepository>,
    tx: TransactionManager,
}

impl MovieService {
    pub fn new(movies: Arc<dyn MovieRepository>, tx: TransactionManager) -> Self {
        Self { movies, tx }
    }

    #[instrument(skip_all, fields(title = %info.title))]
    pub async fn find_by_release_date_and_title(
        &self,
        ctx: &TxContext,
        info: &MovieInfo,
    ) -> Result<Movie> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                self.movies.get_by_release_date_and_title(&ctx, info).await
            })
            .await
    }

    pub async fn get_all(&self, ctx: &TxContext) -> Result<Vec<Movie>> {
        self.tx
            .in_transaction(ctx, |ctx| async move { self.movies.get_all(&ctx).await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use moviebase_types::errors::{ApplicationError, DbError};

    use super::*;
    use crate::test_utils::tests::MemoryTransactionSource;

    #[tokio::test]
    async fn test_find_movie_by_title_and_date() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        let app = source.app();
        let ctx = TxContext::background();

        let found = app
            .movies
            .find_by_release_date_and_title(&ctx, &heat.info())
            .await?;
        assert_eq!(found.id, heat.id);
        assert_eq!(found.rating, 0.0);

        let missing = app
            .movies
            .find_by_release_date_and_title(&ctx, &MovieInfo::new("Heat", 1996, 12, 15))
            .await;
        assert!(matches!(
            missing,
            Err(ApplicationError::Db(DbError::MovieNotFound(_)))
        ));

        // Each call owned exactly one transaction.
        assert_eq!(source.begins(), 2);
        assert_eq!(source.commits(), 1);
        assert_eq!(source.rollbacks(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_padded_title_finds_stored_movie() -> Result<()> {
        let source = MemoryTransactionSource::new();
        let heat = source.seed_movie("Heat", 1995, 12, 15);
        let app = source.app();

        let found = app
            .movies
            .find_by_release_date_and_title(
                &TxContext::background(),
                &MovieInfo::new("  Heat ", 1995, 12, 15),
            )
            .await?;
        assert_eq!(found.id, heat.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_lists_seeded_movies() -> Result<()> {
        let source = MemoryTransactionSource::new();
        source.seed_movie("Heat", 1995, 12, 15);
        source.seed_movie("Alien", 1979, 5, 25);
        let app = source.app();

        let movies = app.movies.get_all(&TxContext::background()).await?;
        assert_eq!(movies.len(), 2);
        Ok(())
    }
}
