//! Application services. Every public method is one unit of work: it joins
//! the transaction carried by the caller's context or opens its own.

mod movie_service;
mod review_like_service;
mod review_service;
mod user_movie_service;
mod user_service;

pub use movie_service::MovieService;
pub use review_like_service::ReviewLikeService;
pub use review_service::ReviewService;
pub use user_movie_service::UserMovieService;
pub use user_service::UserService;
