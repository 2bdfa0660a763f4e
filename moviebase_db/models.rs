use chrono::NaiveDate;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow, Clone)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub director: String,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
    pub rating: f64,
}

#[derive(Debug, FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, FromRow, Clone)]
pub struct UserMovie {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub list_type: Option<String>,
    pub user_rating: i32,
}

/// A movie joined with one user's relation to it.
#[derive(Debug, FromRow, Clone)]
pub struct MovieUserInfo {
    pub title: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub director: String,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
    pub rating: f64,
    pub list_type: Option<String>,
    pub user_rating: i32,
}

#[derive(Debug, FromRow, Clone)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub text: String,
    pub writing_date: NaiveDate,
}

#[derive(Debug, FromRow, Clone)]
pub struct ReviewInfo {
    pub id: Uuid,
    pub username: String,
    pub text: String,
    pub writing_date: NaiveDate,
    pub user_rating: i32,
    pub is_liked: bool,
    pub likes: i64,
}
