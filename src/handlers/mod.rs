// handlers/mod.rs - Handlers grouped by access tier
//
// public:    no authentication (movie reads, partial update, registration, tokens, health)
// protected: require a verified bearer token (movie create and delete)
pub mod protected;
pub mod public;

use crate::error::ApiError;

/// Parse a path id. Negative or non-numeric ids are invalid; unknown ids surface later as NotFound.
pub(crate) fn parse_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 0 => Ok(id),
        _ => Err(ApiError::invalid(format!("Invalid \"ID\" parameter format: {}", raw))),
    }
}
