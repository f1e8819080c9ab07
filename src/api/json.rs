use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    Json,
};
use axum::extract::Query;

use crate::error::ApiError;

const MALFORMED_BODY_MESSAGE: &str = "JSON body format is incorrect.";
const OVERSIZED_BODY_MESSAGE: &str = "JSON body is too large.";

/// Pull the offending key out of serde's `unknown field `x`, expected ...` message.
fn unknown_field(detail: &str) -> Option<&str> {
    let start = detail.find("unknown field `")? + "unknown field `".len();
    let rest = &detail[start..];
    let end = rest.find('`')?;
    Some(&rest[..end])
}

/// Map a JSON extraction result onto the error taxonomy. Every failure is `Invalid`.
pub fn decode_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            let detail = rejection.body_text();
            tracing::debug!(detail = %detail, "rejected request body");

            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                return Err(ApiError::invalid(OVERSIZED_BODY_MESSAGE));
            }
            match unknown_field(&detail) {
                Some(key) => Err(ApiError::invalid(format!(
                    "JSON body contains unknown key \"{}\".",
                    key
                ))),
                None => Err(ApiError::invalid(MALFORMED_BODY_MESSAGE)),
            }
        }
    }
}

pub fn decode_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query.map(|Query(value)| value).map_err(|rejection| {
        tracing::debug!(detail = %rejection.body_text(), "rejected query string");
        ApiError::invalid("Query string format is incorrect.")
    })
}
