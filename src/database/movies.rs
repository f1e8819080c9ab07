use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use tracing::debug;

use super::manager::with_deadline;
use super::models::{Movie, MovieFilter};
use super::store::{movie_edit_conflict, movie_not_found, MovieStore};
use super::DatabaseError;

const MOVIE_COLUMNS: &str = "id, title, release_date, runtime, genres, version";

/// Postgres-backed movie store. Each call is one transaction under the query deadline.
#[derive(Clone)]
pub struct PgMovieStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgMovieStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    fn list_query(filter: &MovieFilter) -> String {
        let direction = if filter.sort_descending() { "DESC" } else { "ASC" };
        format!(
            "SELECT {MOVIE_COLUMNS} FROM movies \
             WHERE (LOWER(title) = LOWER($1) OR $1 = '') \
             AND (genres @> $2 OR $2 = '{{}}') \
             ORDER BY {} {}, id ASC \
             LIMIT $3 OFFSET $4",
            filter.sort_column(),
            direction
        )
    }
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn get(&self, id: i64) -> Result<Movie, DatabaseError> {
        with_deadline(self.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let movie = sqlx::query_as::<_, Movie>(&format!(
                "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
            tx.commit().await?;

            movie.ok_or_else(|| movie_not_found(id))
        })
        .await
    }

    async fn get_all(&self, filter: &MovieFilter) -> Result<Vec<Movie>, DatabaseError> {
        let sql = Self::list_query(filter);
        debug!(sql = %sql, "listing movies");

        with_deadline(self.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let movies = sqlx::query_as::<_, Movie>(&sql)
                .bind(&filter.title)
                .bind(&filter.genres)
                .bind(filter.limit())
                .bind(filter.offset())
                .fetch_all(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok::<_, DatabaseError>(movies)
        })
        .await
    }

    async fn create(&self, movie: &Movie) -> Result<Movie, DatabaseError> {
        with_deadline(self.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let (id, version): (i64, i32) = sqlx::query_as(
                "INSERT INTO movies (title, release_date, runtime, genres) \
                 VALUES ($1, $2, $3, $4) RETURNING id, version",
            )
            .bind(&movie.title)
            .bind(movie.release_date)
            .bind(movie.runtime)
            .bind(&movie.genres)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;

            Ok::<_, DatabaseError>(Movie {
                id,
                version,
                ..movie.clone()
            })
        })
        .await
    }

    async fn update(&self, movie: &Movie, expected_version: i32) -> Result<i32, DatabaseError> {
        with_deadline(self.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let version: Option<i32> = sqlx::query_scalar(
                "UPDATE movies \
                 SET title = $1, release_date = $2, runtime = $3, genres = $4, version = version + 1 \
                 WHERE id = $5 AND version = $6 \
                 RETURNING version",
            )
            .bind(&movie.title)
            .bind(movie.release_date)
            .bind(movie.runtime)
            .bind(&movie.genres)
            .bind(movie.id)
            .bind(expected_version)
            .fetch_optional(&mut *tx)
            .await?;
            tx.commit().await?;

            version.ok_or_else(|| movie_edit_conflict(movie.id))
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        with_deadline(self.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let result = sqlx::query("DELETE FROM movies WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            if result.rows_affected() == 0 {
                return Err(movie_not_found(id));
            }
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        with_deadline(self.query_timeout, async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok::<_, DatabaseError>(())
        })
        .await
    }
}
