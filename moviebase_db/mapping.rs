use chrono::Datelike;

use moviebase_types::{
    errors::DomainError,
    movie::{Movie, MovieId},
    review::{Review, ReviewId, ReviewInfo},
    user::{User, UserId},
    user_movie::{ListType, MovieUserInfo, UserMovie, UserMovieId},
};

use crate::models as db_models;

fn list_type(column: Option<String>) -> Result<ListType, DomainError> {
    ListType::parse(column.as_deref().unwrap_or_default())
}

impl From<db_models::Movie> for Movie {
    fn from(row: db_models::Movie) -> Self {
        Movie::new(
            MovieId(row.id),
            &row.title,
            &row.description,
            row.release_date,
            &row.director,
            row.actors,
            row.genres,
            row.rating,
        )
    }
}

impl From<db_models::User> for User {
    fn from(row: db_models::User) -> Self {
        User::from_parts(UserId(row.id), row.username, row.email, row.password_hash)
    }
}

impl TryFrom<db_models::UserMovie> for UserMovie {
    type Error = DomainError;

    fn try_from(row: db_models::UserMovie) -> Result<Self, Self::Error> {
        UserMovie::from_parts(
            UserMovieId(row.id),
            UserId(row.user_id),
            MovieId(row.movie_id),
            list_type(row.list_type)?,
            row.user_rating,
        )
    }
}

impl TryFrom<db_models::MovieUserInfo> for MovieUserInfo {
    type Error = DomainError;

    fn try_from(row: db_models::MovieUserInfo) -> Result<Self, Self::Error> {
        Ok(MovieUserInfo {
            title: row.title,
            description: row.description,
            release_date: row.release_date,
            director: row.director,
            actors: row.actors,
            genres: row.genres,
            rating: row.rating,
            list_type: list_type(row.list_type)?,
            user_rating: row.user_rating,
        })
    }
}

impl From<db_models::Review> for Review {
    fn from(row: db_models::Review) -> Self {
        Review::from_parts(
            ReviewId(row.id),
            UserId(row.user_id),
            MovieId(row.movie_id),
            row.text,
            row.writing_date,
        )
    }
}

impl From<db_models::ReviewInfo> for ReviewInfo {
    fn from(row: db_models::ReviewInfo) -> Self {
        ReviewInfo {
            id: ReviewId(row.id),
            username: row.username,
            text: row.text,
            review_year: row.writing_date.year(),
            review_month: row.writing_date.month(),
            review_day: row.writing_date.day(),
            user_rating: row.user_rating,
            is_liked: row.is_liked,
            likes: row.likes,
        }
    }
}
