use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::DomainError,
    movie::MovieId,
    user::UserId,
    user_movie::validate_user_rating,
};

const MAX_TEXT_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub Uuid);

impl std::fmt::Display for ReviewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Review text must be non-empty and shorter than 200 bytes.
pub fn validate_review_text(text: &str) -> Result<(), DomainError> {
    if text.is_empty() || text.len() >= MAX_TEXT_LEN {
        return Err(DomainError::ReviewTextInvalid);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    id: Option<ReviewId>,
    pub user_id: UserId,
    pub movie_id: MovieId,
    text: String,
    writing_date: NaiveDate,
    user_rating: i32,
}

impl Review {
    pub fn new(user_id: UserId, movie_id: MovieId) -> Self {
        Self {
            id: None,
            user_id,
            movie_id,
            text: String::new(),
            writing_date: NaiveDate::default(),
            user_rating: 0,
        }
    }

    pub fn from_parts(
        id: ReviewId,
        user_id: UserId,
        movie_id: MovieId,
        text: String,
        writing_date: NaiveDate,
    ) -> Self {
        Self {
            id: Some(id),
            user_id,
            movie_id,
            text,
            writing_date,
            user_rating: 0,
        }
    }

    pub fn id(&self) -> Option<ReviewId> {
        self.id
    }

    pub fn set_id(&mut self, id: ReviewId) -> Result<(), DomainError> {
        if self.id.is_some() {
            return Err(DomainError::IdAlreadyAssigned("review"));
        }
        self.id = Some(id);
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) -> Result<(), DomainError> {
        validate_review_text(text)?;
        self.text = text.to_string();
        Ok(())
    }

    pub fn writing_date(&self) -> NaiveDate {
        self.writing_date
    }

    pub fn set_writing_date(&mut self, date: NaiveDate) {
        self.writing_date = date;
    }

    pub fn user_rating(&self) -> i32 {
        self.user_rating
    }

    pub fn set_user_rating(&mut self, rating: i32) -> Result<(), DomainError> {
        validate_user_rating(rating)?;
        self.user_rating = rating;
        Ok(())
    }
}

/// Review as listed under a movie, with its author and like count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInfo {
    pub id: ReviewId,
    pub username: String,
    pub text: String,
    pub review_year: i32,
    pub review_month: u32,
    pub review_day: u32,
    pub user_rating: i32,
    pub is_liked: bool,
    pub likes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_text_bounds() {
        assert!(matches!(
            validate_review_text(""),
            Err(DomainError::ReviewTextInvalid)
        ));
        assert!(validate_review_text("ok").is_ok());
        assert!(validate_review_text(&"a".repeat(199)).is_ok());
        assert!(validate_review_text(&"a".repeat(200)).is_err());
    }

    #[test]
    fn test_set_text_keeps_previous_on_error() {
        let mut review = Review::new(UserId(Uuid::new_v4()), MovieId(Uuid::new_v4()));
        review.set_text("Great pacing").unwrap();
        assert!(review.set_text("").is_err());
        assert_eq!(review.text(), "Great pacing");
    }

    #[test]
    fn test_review_info_serializes_snake_case() {
        let info = ReviewInfo {
            id: ReviewId(Uuid::nil()),
            username: "neo".into(),
            text: "Whoa".into(),
            review_year: 1999,
            review_month: 3,
            review_day: 31,
            user_rating: 9,
            is_liked: true,
            likes: 3,
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["review_year"], 1999);
        assert_eq!(value["is_liked"], true);
        assert_eq!(value["likes"], 3);
    }
}
