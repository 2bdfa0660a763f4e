use uuid::Uuid;

use moviebase_app::{
    repository::UserMovieRepository,
    tx::{TransactionManager, TxContext},
};
use moviebase_types::{
    Result,
    errors::DbError,
    movie::MovieId,
    user::UserId,
    user_movie::{ListType, MovieUserInfo, UserMovie, UserMovieId},
};

use crate::{models as db_models, transaction::PgTransaction};

// Every movie joined with the user's row for it, if any. `$1` is the user.
const SELECT_MOVIES_FOR_USER: &str = r#"
    SELECT m.title, m.description, m.release_date, m.director, m.actors, m.genres,
           COALESCE((
               SELECT AVG(r.user_rating)
               FROM user_movies AS r
               WHERE r.movie_id = m.id AND r.user_rating != 0
           ), 0)::float8 AS rating,
           um.list_type,
           COALESCE(um.user_rating, 0) AS user_rating
    FROM movies AS m
    LEFT JOIN user_movies AS um ON um.movie_id = m.id AND um.user_id = $1
"#;

#[derive(Clone)]
pub struct PostgresUserMovieRepository {
    tx: TransactionManager,
}

impl PostgresUserMovieRepository {
    pub fn new(tx: TransactionManager) -> Self {
        Self { tx }
    }
}

#[async_trait::async_trait]
impl UserMovieRepository for PostgresUserMovieRepository {
    async fn save(&self, ctx: &TxContext, user_movie: &mut UserMovie) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;

                if user_movie.id().is_none() {
                    let id: Uuid = sqlx::query_scalar(
                        r#"
                        INSERT INTO user_movies (user_id, movie_id, list_type, user_rating)
                        VALUES ($1, $2, $3, $4)
                        RETURNING id
                        "#,
                    )
                    .bind(user_movie.user_id.0)
                    .bind(user_movie.movie_id.0)
                    .bind(user_movie.list_type().as_column())
                    .bind(user_movie.user_rating())
                    .fetch_one(guard.conn()?)
                    .await?;
                    user_movie.set_id(UserMovieId(id))?;
                    return Ok(());
                }

                let result = sqlx::query(
                    r#"
                    UPDATE user_movies
                    SET list_type = $1, user_rating = $2
                    WHERE user_id = $3 AND movie_id = $4
                    "#,
                )
                .bind(user_movie.list_type().as_column())
                .bind(user_movie.user_rating())
                .bind(user_movie.user_id.0)
                .bind(user_movie.movie_id.0)
                .execute(guard.conn()?)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::UserMovieNotFound.into());
                }
                Ok(())
            })
            .await
    }

    async fn delete(&self, ctx: &TxContext, user_movie: &UserMovie) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let result =
                    sqlx::query("DELETE FROM user_movies WHERE user_id = $1 AND movie_id = $2")
                        .bind(user_movie.user_id.0)
                        .bind(user_movie.movie_id.0)
                        .execute(guard.conn()?)
                        .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::UserMovieNotFound.into());
                }
                Ok(())
            })
            .await
    }

    async fn get_by_user_and_movie(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        movie_id: MovieId,
    ) -> Result<UserMovie> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let row: Option<db_models::UserMovie> = sqlx::query_as(
                    r#"
                    SELECT id, user_id, movie_id, list_type, user_rating
                    FROM user_movies
                    WHERE user_id = $1 AND movie_id = $2
                    "#,
                )
                .bind(user_id.0)
                .bind(movie_id.0)
                .fetch_optional(guard.conn()?)
                .await?;

                let row = row.ok_or(DbError::UserMovieNotFound)?;
                Ok(UserMovie::try_from(row)?)
            })
            .await
    }

    async fn get_movies_by_user_and_list_type(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        list_type: ListType,
    ) -> Result<Vec<MovieUserInfo>> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let query = format!(
                    "{SELECT_MOVIES_FOR_USER} WHERE um.list_type IS NOT DISTINCT FROM $2 \
                     ORDER BY m.release_date, m.title"
                );
                let rows: Vec<db_models::MovieUserInfo> = sqlx::query_as(&query)
                    .bind(user_id.0)
                    .bind(list_type.as_column())
                    .fetch_all(guard.conn()?)
                    .await?;

                let movies = rows
                    .into_iter()
                    .map(MovieUserInfo::try_from)
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(movies)
            })
            .await
    }

    async fn get_movie_by_user_and_list_type(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        movie_id: MovieId,
        list_type: ListType,
    ) -> Result<MovieUserInfo> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let query = format!(
                    "{SELECT_MOVIES_FOR_USER} WHERE m.id = $2 \
                     AND um.list_type IS NOT DISTINCT FROM $3"
                );
                let row: Option<db_models::MovieUserInfo> = sqlx::query_as(&query)
                    .bind(user_id.0)
                    .bind(movie_id.0)
                    .bind(list_type.as_column())
                    .fetch_optional(guard.conn()?)
                    .await?;

                let row = row.ok_or(DbError::UserMovieNotFound)?;
                Ok(MovieUserInfo::try_from(row)?)
            })
            .await
    }
}
