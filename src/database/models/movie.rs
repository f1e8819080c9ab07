use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{ApiError, Violations};

pub const MAX_TITLE_BYTES: usize = 500;
pub const MAX_GENRES: usize = 5;

/// Columns a movie listing may be sorted on. A leading `-` sorts descending.
pub const SORT_FIELDS: [&str; 6] = ["id", "title", "release_date", "runtime", "genres", "version"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: NaiveDate,
    pub runtime: i32,
    pub genres: Vec<String>,
    pub version: i32,
}

/// Unvalidated movie fields, as assembled from a create payload or a merged partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieDraft {
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub runtime: i32,
    pub genres: Vec<String>,
}

impl From<&Movie> for MovieDraft {
    fn from(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone(),
            release_date: Some(movie.release_date),
            runtime: movie.runtime,
            genres: movie.genres.clone(),
        }
    }
}

fn earliest_release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1800, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl MovieDraft {
    fn check(&self, violations: &mut Violations, today: NaiveDate) {
        if self.title.is_empty() {
            violations.add("title", "Must be provided.");
        }
        violations.check(
            self.title.len() <= MAX_TITLE_BYTES,
            "title",
            "Must not be more than 500 bytes long.",
        );

        match self.release_date {
            None => violations.add("release_date", "Must be provided."),
            Some(date) => violations.check(
                date >= earliest_release_date() && date <= today,
                "release_date",
                "Must be greater than 1800-01-01 and not in the future.",
            ),
        }

        if self.runtime == 0 {
            violations.add("runtime", "Must be provided.");
        }
        violations.check(self.runtime >= 0, "runtime", "Must be greater than 0.");

        if self.genres.is_empty() {
            violations.add("genres", "Must be provided.");
        }
        violations.check(
            self.genres.len() <= MAX_GENRES,
            "genres",
            "Must not contain more than 5 genres.",
        );
        let mut seen = std::collections::HashSet::new();
        violations.check(
            self.genres.iter().all(|g| seen.insert(g.as_str())),
            "genres",
            "Must not contain duplicate values.",
        );
    }

    /// Validate and produce a movie carrying the given identity.
    pub fn into_movie(self, id: i64, version: i32, today: NaiveDate) -> Result<Movie, ApiError> {
        let mut violations = Violations::new();
        self.check(&mut violations, today);
        violations.into_result("Movie is invalid.")?;

        let Some(release_date) = self.release_date else {
            return Err(ApiError::invalid("Movie is invalid."));
        };
        Ok(Movie {
            id,
            title: self.title,
            release_date,
            runtime: self.runtime,
            genres: self.genres,
            version,
        })
    }
}

/// Listing parameters for `GET /movies`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieFilter {
    /// Case-insensitive exact title match; empty matches everything.
    pub title: String,
    /// Every listed genre must be present on the movie.
    pub genres: Vec<String>,
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
}

impl Default for MovieFilter {
    fn default() -> Self {
        Self {
            title: String::new(),
            genres: Vec::new(),
            page: 1,
            page_size: 20,
            sort: "id".to_string(),
        }
    }
}

impl MovieFilter {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        violations.check(
            (1..=10_000_000).contains(&self.page),
            "page",
            "Must be between 1 and 10_000_000.",
        );
        violations.check(
            (1..=100).contains(&self.page_size),
            "page_size",
            "Must be between 1 and 100.",
        );
        let field = self.sort.strip_prefix('-').unwrap_or(&self.sort);
        violations.check(SORT_FIELDS.contains(&field), "sort", "Parameter is incorrect.");
        violations.into_result("Movie filter parameter(s) is/are invalid.")
    }

    /// Whitelisted column for the sort parameter; never echoes caller input.
    pub fn sort_column(&self) -> &'static str {
        let field = self.sort.strip_prefix('-').unwrap_or(&self.sort);
        SORT_FIELDS
            .iter()
            .find(|candidate| **candidate == field)
            .copied()
            .unwrap_or("id")
    }

    pub fn sort_descending(&self) -> bool {
        self.sort.starts_with('-')
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}
