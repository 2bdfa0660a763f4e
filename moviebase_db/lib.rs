mod connection;
mod mapping;
mod models;
mod repository;
mod transaction;

use std::sync::Arc;

use moviebase_app::{Repositories, TransactionManager};

pub use connection::{DbPool, establish_connection_pool, establish_test_connection_pool};
pub use repository::*;
pub use transaction::{PgTransaction, PgTransactionSource};

/// Postgres repositories sharing one transaction manager over `pool`.
pub fn postgres_repositories(pool: DbPool) -> (Repositories, TransactionManager) {
    let tx = TransactionManager::new(Arc::new(PgTransactionSource::new(pool)));
    let repositories = Repositories {
        movies: Arc::new(PostgresMovieRepository::new(tx.clone())),
        users: Arc::new(PostgresUserRepository::new(tx.clone())),
        user_movies: Arc::new(PostgresUserMovieRepository::new(tx.clone())),
        reviews: Arc::new(PostgresReviewRepository::new(tx.clone())),
        review_likes: Arc::new(PostgresReviewLikeRepository::new(tx.clone())),
    };
    (repositories, tx)
}
