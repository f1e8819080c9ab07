// HTTP API error taxonomy
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::database::DatabaseError;

/// Message returned for every internal failure. The cause stays server-side.
pub const SERVER_ERROR_MESSAGE: &str = "Server error.";

/// Domain error. Every failure that reaches a handler boundary is exactly one of these kinds.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 404 Not Found
    #[error("not found: {0}")]
    NotFound(String),

    // 422 Unprocessable Entity
    #[error("invalid: {message}")]
    Invalid {
        message: String,
        violations: BTreeMap<String, Vec<String>>,
    },

    // 409 Conflict
    #[error("conflict: {0}")]
    Conflict(String),

    // 429 Too Many Requests
    #[error("rate limited: {0}")]
    RateLimited(String),

    // 401 Unauthorized
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    // 500 Internal Server Error
    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Invalid error without field violations (e.g. malformed request body).
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid {
            message: message.into(),
            violations: BTreeMap::new(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn rate_limited() -> Self {
        ApiError::RateLimited("Rate limit exceeded.".to_string())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn internal(cause: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal(cause.into())
    }

    /// HTTP status for this error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Invalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe message
    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::RateLimited(msg)
            | ApiError::Unauthorized(msg) => msg,
            ApiError::Invalid { message, .. } => message,
            ApiError::Internal(_) => SERVER_ERROR_MESSAGE,
        }
    }
}

/// Accumulates per-field validation messages and turns them into an `Invalid` error.
#[derive(Debug, Default)]
pub struct Violations {
    fields: BTreeMap<String, Vec<String>>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Add `message` for `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise an `Invalid` error carrying every violation.
    pub fn into_result(self, message: impl Into<String>) -> Result<(), ApiError> {
        if self.fields.is_empty() {
            return Ok(());
        }
        Err(ApiError::Invalid {
            message: message.into(),
            violations: self.fields,
        })
    }
}

/// JSON envelope for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_fields: Option<BTreeMap<String, String>>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            invalid_fields: None,
        }
    }
}

/// Map an error to its status code and client-visible body. Pure: no logging, no I/O.
pub fn classify(err: &ApiError) -> (StatusCode, ErrorBody) {
    let body = match err {
        ApiError::Invalid {
            message,
            violations,
        } => ErrorBody {
            message: message.clone(),
            // Only field validation failures carry `invalid_fields`.
            invalid_fields: (!violations.is_empty()).then(|| {
                violations
                    .iter()
                    .map(|(field, messages)| (field.clone(), messages.join(" ")))
                    .collect()
            }),
        },
        other => ErrorBody::new(other.message()),
    };
    (err.status_code(), body)
}

/// Render an envelope. Falls back to an empty 500 if the body itself cannot be encoded.
pub fn error_response(status: StatusCode, body: &ErrorBody) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode error response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::NotFound(msg),
            DatabaseError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.into()),
        }
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = classify(&self);
        match &self {
            ApiError::Internal(cause) => {
                tracing::error!(status = status.as_u16(), error = ?cause, "request failed");
            }
            other => {
                tracing::debug!(status = status.as_u16(), error = %other, "request rejected");
            }
        }
        error_response(status, &body)
    }
}
