use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovieId(pub Uuid);

impl std::fmt::Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifies a movie by title and release date, the way clients address it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieInfo {
    pub title: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl MovieInfo {
    pub fn new(title: impl Into<String>, year: i32, month: u32, day: u32) -> Self {
        let title: String = title.into();
        Self {
            title: title.trim().to_string(),
            year,
            month,
            day,
        }
    }

    /// Title as stored: surrounding whitespace is never part of it.
    pub fn lookup_title(&self) -> &str {
        self.title.trim()
    }

    pub fn release_date(&self) -> Result<NaiveDate, DomainError> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or(
            DomainError::InvalidReleaseDate {
                year: self.year,
                month: self.month,
                day: self.day,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub director: String,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
    /// Average of the non-zero user ratings, 0 when nobody rated it.
    pub rating: f64,
}

impl Movie {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: MovieId,
        title: &str,
        description: &str,
        release_date: NaiveDate,
        director: &str,
        actors: Vec<String>,
        genres: Vec<String>,
        rating: f64,
    ) -> Self {
        Self {
            id,
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            release_date,
            director: director.trim().to_string(),
            actors,
            genres,
            rating,
        }
    }

    pub fn info(&self) -> MovieInfo {
        use chrono::Datelike;

        MovieInfo::new(
            self.title.clone(),
            self.release_date.year(),
            self.release_date.month(),
            self.release_date.day(),
        )
    }
}
