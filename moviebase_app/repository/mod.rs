mod movie_repository;
mod review_like_repository;
mod review_repository;
mod user_movie_repository;
mod user_repository;

pub use movie_repository::MovieRepository;
pub use review_like_repository::ReviewLikeRepository;
pub use review_repository::{REVIEWS_PAGE_LIMIT, ReviewRepository};
pub use user_movie_repository::UserMovieRepository;
pub use user_repository::UserRepository;
