use serde::Serialize;
use sqlx::FromRow;

use crate::auth::password;
use crate::error::{ApiError, Violations};

pub const MAX_NAME_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub activated: bool,
    #[serde(skip_serializing)]
    pub version: i32,
}

/// Registration input prior to hashing.
#[derive(Debug, Clone, Default)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl UserDraft {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();

        if self.name.is_empty() {
            violations.add("name", "Must be provided.");
        }
        violations.check(
            self.name.chars().count() <= MAX_NAME_CHARS,
            "name",
            "Must not be more than 500 characters long.",
        );

        if self.email.is_empty() {
            violations.add("email", "Must be provided.");
        } else {
            violations.check(is_valid_email(&self.email), "email", "Is invalid.");
        }

        password::check_plaintext(&mut violations, &self.password);

        violations.into_result("User is invalid.")
    }
}

/// Structural address check: a non-empty local part and a dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}
