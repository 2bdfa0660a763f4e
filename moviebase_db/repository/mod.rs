mod movie_repository;
mod review_like_repository;
mod review_repository;
mod user_movie_repository;
mod user_repository;

pub use movie_repository::PostgresMovieRepository;
pub use review_like_repository::PostgresReviewLikeRepository;
pub use review_repository::PostgresReviewRepository;
pub use user_movie_repository::PostgresUserMovieRepository;
pub use user_repository::PostgresUserRepository;
