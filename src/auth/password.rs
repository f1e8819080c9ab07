use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::{ApiError, Violations};

pub const MIN_PASSWORD_BYTES: usize = 8;
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Record plaintext password violations under the `password` field.
pub fn check_plaintext(violations: &mut Violations, plaintext: &str) {
    if plaintext.is_empty() {
        violations.add("password", "Must be provided.");
        return;
    }
    violations.check(
        plaintext.len() >= MIN_PASSWORD_BYTES,
        "password",
        "Must be at least 8 bytes long.",
    );
    violations.check(
        plaintext.len() <= MAX_PASSWORD_BYTES,
        "password",
        "Must not be more than 72 bytes long.",
    );
}

/// Validate a plaintext password on its own.
pub fn validate_plaintext(plaintext: &str) -> Result<(), ApiError> {
    let mut violations = Violations::new();
    check_plaintext(&mut violations, plaintext);
    violations.into_result("Password is invalid.")
}

/// Hash a password using Argon2id.
pub fn hash(plaintext: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(anyhow::anyhow!("failed to hash password: {e}")))
}

/// Whether `plaintext` matches the stored PHC hash. A malformed stored hash is an internal error.
pub fn verify(stored: &str, plaintext: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| ApiError::internal(anyhow::anyhow!("stored password hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash`] on the blocking pool.
pub async fn hash_blocking(plaintext: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash(&plaintext))
        .await
        .map_err(ApiError::internal)?
}

/// [`verify`] on the blocking pool.
pub async fn verify_blocking(stored: String, plaintext: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify(&stored, &plaintext))
        .await
        .map_err(ApiError::internal)?
}
