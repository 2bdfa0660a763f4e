use moviebase_app::{
    repository::MovieRepository,
    tx::{TransactionManager, TxContext},
};
use moviebase_types::{
    Result,
    errors::DbError,
    movie::{Movie, MovieId, MovieInfo},
};

use crate::{models as db_models, transaction::PgTransaction};

const SELECT_MOVIES: &str = r#"
    SELECT m.id, m.title, m.description, m.release_date, m.director, m.actors, m.genres,
           COALESCE((
               SELECT AVG(um.user_rating)
               FROM user_movies AS um
               WHERE um.movie_id = m.id AND um.user_rating != 0
           ), 0)::float8 AS rating
    FROM movies AS m
"#;

/// Implements MovieRepository on the ambient transaction.
#[derive(Clone)]
pub struct PostgresMovieRepository {
    tx: TransactionManager,
}

impl PostgresMovieRepository {
    pub fn new(tx: TransactionManager) -> Self {
        Self { tx }
    }
}

#[async_trait::async_trait]
impl MovieRepository for PostgresMovieRepository {
    async fn get_all(&self, ctx: &TxContext) -> Result<Vec<Movie>> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let query = format!("{SELECT_MOVIES} ORDER BY m.release_date, m.title");
                let rows: Vec<db_models::Movie> = sqlx::query_as(&query)
                    .fetch_all(guard.conn()?)
                    .await?;

                Ok(rows.into_iter().map(Into::into).collect())
            })
            .await
    }

    async fn get_by_release_date_and_title(
        &self,
        ctx: &TxContext,
        info: &MovieInfo,
    ) -> Result<Movie> {
        let release_date = info.release_date()?;
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let query = format!("{SELECT_MOVIES} WHERE m.title = $1 AND m.release_date = $2");
                let row: Option<db_models::Movie> = sqlx::query_as(&query)
                    .bind(info.lookup_title())
                    .bind(release_date)
                    .fetch_optional(guard.conn()?)
                    .await?;

                row.map(Into::into)
                    .ok_or_else(|| DbError::MovieNotFound(info.title.clone()).into())
            })
            .await
    }

    async fn get_id_by_release_date_and_title(
        &self,
        ctx: &TxContext,
        info: &MovieInfo,
    ) -> Result<MovieId> {
        let release_date = info.release_date()?;
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let id: Option<uuid::Uuid> = sqlx::query_scalar(
                    "SELECT id FROM movies WHERE title = $1 AND release_date = $2",
                )
                .bind(info.lookup_title())
                .bind(release_date)
                .fetch_optional(guard.conn()?)
                .await?;

                id.map(MovieId)
                    .ok_or_else(|| DbError::MovieNotFound(info.title.clone()).into())
            })
            .await
    }
}
