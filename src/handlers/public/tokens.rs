// handlers/public/tokens.rs - POST /auth/token

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::decode_json;
use crate::app::AppState;
use crate::auth::password;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials.";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /auth/token - exchange email and password for a bearer token.
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn token_create(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let request = decode_json(payload)?;
    password::validate_plaintext(&request.password)?;

    let user = match state.users.get_by_email(&request.email).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound(_)) => {
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        }
        Err(e) => return Err(e.into()),
    };

    if !password::verify_blocking(user.password_hash, request.password).await? {
        tracing::debug!(user_id = user.id, "password mismatch");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
    }

    let token = state.auth.issue(user.id).map_err(ApiError::internal)?;
    Ok(ApiResponse::created(TokenResponse { token }))
}
