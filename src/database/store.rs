use async_trait::async_trait;

use super::models::{Movie, MovieFilter, User};
use super::DatabaseError;

/// Versioned movie persistence. Updates are conditional on the expected version;
/// a miss is always a `Conflict`, even when the row has since been deleted.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Movie, DatabaseError>;

    async fn get_all(&self, filter: &MovieFilter) -> Result<Vec<Movie>, DatabaseError>;

    /// Insert `movie`, ignoring its id and version. Returns the stored row with id and `version = 1`.
    async fn create(&self, movie: &Movie) -> Result<Movie, DatabaseError>;

    /// Write `movie` if the stored version still equals `expected_version`. Returns the new version.
    async fn update(&self, movie: &Movie, expected_version: i32) -> Result<i32, DatabaseError>;

    async fn delete(&self, id: i64) -> Result<(), DatabaseError>;

    /// Round-trip to the backing storage. Stores without one are always reachable.
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_email(&self, email: &str) -> Result<User, DatabaseError>;

    /// Insert `user`. A duplicate email is a `Conflict`.
    async fn create(&self, user: &User) -> Result<User, DatabaseError>;

    async fn update(&self, user: &User, expected_version: i32) -> Result<i32, DatabaseError>;
}

pub(crate) fn movie_not_found(id: i64) -> DatabaseError {
    DatabaseError::NotFound(format!("Movie with id={} is not found.", id))
}

pub(crate) fn movie_edit_conflict(id: i64) -> DatabaseError {
    DatabaseError::Conflict(format!("Conflicting change for the movie with id={}.", id))
}

pub(crate) fn user_not_found() -> DatabaseError {
    DatabaseError::NotFound("User is not found.".to_string())
}

pub(crate) fn user_edit_conflict(id: i64) -> DatabaseError {
    DatabaseError::Conflict(format!("Conflicting change for the user with id={}.", id))
}

pub(crate) fn duplicate_email() -> DatabaseError {
    DatabaseError::Conflict("A user with this email already exists.".to_string())
}
