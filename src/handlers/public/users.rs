// handlers/public/users.rs - POST /users

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::api::decode_json;
use crate::app::AppState;
use crate::auth::password;
use crate::database::models::{User, UserDraft};
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /users - register an inactive account; responds `{id, name, email}`
pub async fn user_register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    let request = decode_json(payload)?;
    let draft = UserDraft {
        name: request.name,
        email: request.email,
        password: request.password,
    };
    draft.validate()?;

    let password_hash = password::hash_blocking(draft.password).await?;
    let user = state
        .users
        .create(&User {
            id: 0,
            name: draft.name,
            email: draft.email,
            password_hash,
            activated: false,
            version: 0,
        })
        .await?;

    tracing::info!(user_id = user.id, "user registered");
    Ok(ApiResponse::created(user))
}
