pub mod errors;
pub mod movie;
pub mod review;
pub mod review_like;
pub mod user;
pub mod user_movie;

pub use errors::Result;
