use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::{Authenticator, INVALID_TOKEN_MESSAGE};
use crate::error::ApiError;

/// Identity attached to a request once its bearer token verified. Immutable for the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized(INVALID_TOKEN_MESSAGE))
    }
}

/// Route layer requiring `Authorization: Bearer <token>`.
pub async fn authenticate(
    State(authenticator): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    let verified = bearer_token(request.headers()).and_then(|token| authenticator.verify(token));

    match verified {
        Ok(id) => {
            request.extensions_mut().insert(AuthenticatedUser { id });
            next.run(request).await
        }
        Err(err) => {
            let mut response = err.into_response();
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            response
        }
    }
}

/// Extract the token from the Authorization header. The scheme is checked before the token is parsed.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized(INVALID_TOKEN_MESSAGE))?
        .to_str()
        .map_err(|_| ApiError::unauthorized(INVALID_TOKEN_MESSAGE))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(ApiError::unauthorized(INVALID_TOKEN_MESSAGE)),
    }
}
