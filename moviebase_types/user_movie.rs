use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::DomainError, movie::MovieId, user::UserId};

pub const EMPTY_RATING: i32 = 0;
pub const MAX_RATING: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserMovieId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Favorite,
    Watchlist,
    #[default]
    #[serde(rename = "")]
    None,
}

impl ListType {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "favorite" => Ok(ListType::Favorite),
            "watchlist" => Ok(ListType::Watchlist),
            "" => Ok(ListType::None),
            other => Err(DomainError::InvalidListType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::Favorite => "favorite",
            ListType::Watchlist => "watchlist",
            ListType::None => "",
        }
    }

    /// Column value: `None` is stored as SQL NULL.
    pub fn as_column(&self) -> Option<&'static str> {
        match self {
            ListType::None => None,
            other => Some(other.as_str()),
        }
    }
}

impl std::str::FromStr for ListType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListType::parse(s)
    }
}

pub fn validate_user_rating(rating: i32) -> Result<(), DomainError> {
    if !(EMPTY_RATING..=MAX_RATING).contains(&rating) {
        return Err(DomainError::RatingOutOfRange(rating));
    }
    Ok(())
}

/// Per-user relation to a movie: the list it sits in and the user's rating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMovie {
    id: Option<UserMovieId>,
    pub user_id: UserId,
    pub movie_id: MovieId,
    list_type: ListType,
    user_rating: i32,
}

impl UserMovie {
    pub fn new(user_id: UserId, movie_id: MovieId) -> Self {
        Self {
            id: None,
            user_id,
            movie_id,
            list_type: ListType::None,
            user_rating: EMPTY_RATING,
        }
    }

    /// Rebuilds a stored row, validating the rating it carries.
    pub fn from_parts(
        id: UserMovieId,
        user_id: UserId,
        movie_id: MovieId,
        list_type: ListType,
        user_rating: i32,
    ) -> Result<Self, DomainError> {
        validate_user_rating(user_rating)?;
        Ok(Self {
            id: Some(id),
            user_id,
            movie_id,
            list_type,
            user_rating,
        })
    }

    pub fn id(&self) -> Option<UserMovieId> {
        self.id
    }

    pub fn set_id(&mut self, id: UserMovieId) -> Result<(), DomainError> {
        if self.id.is_some() {
            return Err(DomainError::IdAlreadyAssigned("user movie"));
        }
        self.id = Some(id);
        Ok(())
    }

    pub fn list_type(&self) -> ListType {
        self.list_type
    }

    pub fn set_list_type(&mut self, list_type: ListType) {
        self.list_type = list_type;
    }

    pub fn user_rating(&self) -> i32 {
        self.user_rating
    }

    pub fn set_rating(&mut self, rating: i32) -> Result<(), DomainError> {
        validate_user_rating(rating)?;
        self.user_rating = rating;
        Ok(())
    }

    pub fn is_favorite(&self) -> bool {
        self.list_type == ListType::Favorite
    }

    pub fn is_in_watchlist(&self) -> bool {
        self.list_type == ListType::Watchlist
    }

    pub fn has_rating(&self) -> bool {
        self.user_rating > EMPTY_RATING
    }

    /// Nothing left to remember for this pair: no list and no rating.
    pub fn is_empty(&self) -> bool {
        self.list_type == ListType::None && !self.has_rating()
    }
}

/// A movie as seen by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieUserInfo {
    pub title: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub director: String,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
    pub rating: f64,
    pub list_type: ListType,
    pub user_rating: i32,
}
