use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

use super::manager::with_deadline;
use super::models::User;
use super::store::{duplicate_email, user_edit_conflict, user_not_found, UserStore};
use super::DatabaseError;

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn map_write_error(err: sqlx::Error) -> DatabaseError {
    if is_unique_violation(&err) {
        duplicate_email()
    } else {
        DatabaseError::Sqlx(err)
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgUserStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        with_deadline(self.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let user = sqlx::query_as::<_, User>(
                "SELECT id, name, email, password_hash, activated, version \
                 FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;
            tx.commit().await?;

            user.ok_or_else(user_not_found)
        })
        .await
    }

    async fn create(&self, user: &User) -> Result<User, DatabaseError> {
        with_deadline(self.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let (id, version): (i64, i32) = sqlx::query_as(
                "INSERT INTO users (name, email, password_hash, activated) \
                 VALUES ($1, $2, $3, $4) RETURNING id, version",
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.activated)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_write_error)?;
            tx.commit().await?;

            Ok::<_, DatabaseError>(User {
                id,
                version,
                ..user.clone()
            })
        })
        .await
    }

    async fn update(&self, user: &User, expected_version: i32) -> Result<i32, DatabaseError> {
        with_deadline(self.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            let version: Option<i32> = sqlx::query_scalar(
                "UPDATE users \
                 SET name = $1, email = $2, password_hash = $3, activated = $4, version = version + 1 \
                 WHERE id = $5 AND version = $6 \
                 RETURNING version",
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.activated)
            .bind(user.id)
            .bind(expected_version)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_write_error)?;
            tx.commit().await?;

            version.ok_or_else(|| user_edit_conflict(user.id))
        })
        .await
    }
}
