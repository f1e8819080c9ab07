use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use super::metrics::Metrics;
use crate::error::ApiError;

/// Panic handler for `CatchPanicLayer::custom`. Logs the payload and answers with the
/// standard internal error, asking the client to drop the connection.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "non-string panic payload".to_string()
    };

    let mut response = ApiError::internal(anyhow::anyhow!("handler panicked: {detail}")).into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

/// [`handle_panic`] plus response accounting. A panicking request never returns
/// through `record_metrics`, so its 500 is counted here.
pub fn recover_panic(
    metrics: Arc<Metrics>,
) -> impl FnMut(Box<dyn Any + Send + 'static>) -> Response + Clone {
    move |payload| {
        let response = handle_panic(payload);
        metrics.record_response(response.status(), Duration::ZERO);
        response
    }
}
