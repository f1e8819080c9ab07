use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Duration;

use crate::error::ApiError;

/// Whole-request deadline. An elapsed request is dropped and answered with the
/// internal error envelope. A zero deadline passes everything through.
pub async fn request_deadline(
    State(deadline): State<Duration>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if deadline.is_zero() {
        return Ok(next.run(request).await);
    }

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    tokio::time::timeout(deadline, next.run(request))
        .await
        .map_err(|_| {
            ApiError::internal(anyhow::anyhow!(
                "{method} {path} exceeded request deadline of {deadline:?}"
            ))
        })
}
