use uuid::Uuid;

use moviebase_app::{
    repository::{REVIEWS_PAGE_LIMIT, ReviewRepository},
    tx::{TransactionManager, TxContext},
};
use moviebase_types::{
    Result,
    errors::DbError,
    movie::MovieId,
    review::{Review, ReviewId, ReviewInfo},
    user::UserId,
};

use crate::{models as db_models, transaction::PgTransaction};

#[derive(Clone)]
pub struct PostgresReviewRepository {
    tx: TransactionManager,
}

impl PostgresReviewRepository {
    pub fn new(tx: TransactionManager) -> Self {
        Self { tx }
    }
}

#[async_trait::async_trait]
impl ReviewRepository for PostgresReviewRepository {
    async fn save(&self, ctx: &TxContext, review: &mut Review) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;

                match review.id() {
                    None => {
                        let id: Uuid = sqlx::query_scalar(
                            r#"
                            INSERT INTO reviews (user_id, movie_id, text, writing_date)
                            VALUES ($1, $2, $3, $4)
                            RETURNING id
                            "#,
                        )
                        .bind(review.user_id.0)
                        .bind(review.movie_id.0)
                        .bind(review.text())
                        .bind(review.writing_date())
                        .fetch_one(guard.conn()?)
                        .await?;
                        review.set_id(ReviewId(id))?;
                    }
                    Some(id) => {
                        let result = sqlx::query(
                            "UPDATE reviews SET text = $1, writing_date = $2 WHERE id = $3",
                        )
                        .bind(review.text())
                        .bind(review.writing_date())
                        .bind(id.0)
                        .execute(guard.conn()?)
                        .await?;

                        if result.rows_affected() == 0 {
                            return Err(DbError::ReviewNotFound.into());
                        }
                    }
                }

                Ok(())
            })
            .await
    }

    async fn delete(&self, ctx: &TxContext, review: &Review) -> Result<()> {
        self.tx
            .use_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let result =
                    sqlx::query("DELETE FROM reviews WHERE user_id = $1 AND movie_id = $2")
                        .bind(review.user_id.0)
                        .bind(review.movie_id.0)
                        .execute(guard.conn()?)
                        .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::ReviewNotFound.into());
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
    ) -> Result<Review> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let row: Option<db_models::Review> = sqlx::query_as(
                    r#"
                    SELECT id, user_id, movie_id, text, writing_date
                    FROM reviews
                    WHERE user_id = $1 AND movie_id = $2
                    "#,
                )
                .bind(user_id.0)
                .bind(movie_id.0)
                .fetch_optional(guard.conn()?)
                .await?;

                row.map(Into::into)
                    .ok_or_else(|| DbError::ReviewNotFound.into())
            })
            .await
    }

    async fn get_by_id(&self, ctx: &TxContext, id: ReviewId) -> Result<Review> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let row: Option<db_models::Review> = sqlx::query_as(
                    r#"
                    SELECT id, user_id, movie_id, text, writing_date
                    FROM reviews
                    WHERE id = $1
                    "#,
                )
                .bind(id.0)
                .fetch_optional(guard.conn()?)
                .await?;

                row.map(Into::into)
                    .ok_or_else(|| DbError::ReviewByIdNotFound(id.0).into())
            })
            .await
    }

    async fn get_reviews_by_movie(
        &self,
        ctx: &TxContext,
        movie_id: MovieId,
    ) -> Result<Vec<ReviewInfo>> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let rows: Vec<db_models::ReviewInfo> = sqlx::query_as(
                    r#"
                    SELECT r.id, u.username, r.text, r.writing_date,
                           COALESCE(um.user_rating, 0) AS user_rating,
                           FALSE AS is_liked,
                           (SELECT COUNT(*) FROM review_likes AS rl WHERE rl.review_id = r.id) AS likes
                    FROM reviews AS r
                    JOIN users AS u ON u.id = r.user_id
                    LEFT JOIN user_movies AS um ON um.user_id = r.user_id AND um.movie_id = r.movie_id
                    WHERE r.movie_id = $1
                    ORDER BY likes DESC, u.username
                    LIMIT $2
                    "#,
                )
                .bind(movie_id.0)
                .bind(REVIEWS_PAGE_LIMIT)
                .fetch_all(guard.conn()?)
                .await?;

                Ok(rows.into_iter().map(Into::into).collect())
            })
            .await
    }

    async fn get_reviews_by_movie_for_user(
        &self,
        ctx: &TxContext,
        movie_id: MovieId,
        user_id: UserId,
    ) -> Result<Vec<ReviewInfo>> {
        self.tx
            .in_transaction(ctx, |ctx| async move {
                let mut guard = PgTransaction::from_context(&ctx)?.lock().await;
                let rows: Vec<db_models::ReviewInfo> = sqlx::query_as(
                    r#"
                    SELECT r.id, u.username, r.text, r.writing_date,
                           COALESCE(um.user_rating, 0) AS user_rating,
                           EXISTS(
                               SELECT 1 FROM review_likes AS mine
                               WHERE mine.review_id = r.id AND mine.user_id = $2
                           ) AS is_liked,
                           (SELECT COUNT(*) FROM review_likes AS rl WHERE rl.review_id = r.id) AS likes
                    FROM reviews AS r
                    JOIN users AS u ON u.id = r.user_id
                    LEFT JOIN user_movies AS um ON um.user_id = r.user_id AND um.movie_id = r.movie_id
                    WHERE r.movie_id = $1
                    ORDER BY likes DESC, u.username
                    LIMIT $3
                    "#,
                )
                .bind(movie_id.0)
                .bind(user_id.0)
                .bind(REVIEWS_PAGE_LIMIT)
                .fetch_all(guard.conn()?)
                .await?;

                Ok(rows.into_iter().map(Into::into).collect())
            })
            .await
    }
}
