use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::error::{error_response, ErrorBody};

pub const NOT_FOUND_MESSAGE: &str = "The requested resource could not be found.";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "The method is not supported for this resource.";

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false)
}

/// Replace the router's bare 404/405 bodies with the JSON error envelope.
/// Status and remaining headers (such as `Allow`) are kept as written.
pub async fn normalize_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let message = match response.status() {
        StatusCode::NOT_FOUND => NOT_FOUND_MESSAGE,
        StatusCode::METHOD_NOT_ALLOWED => METHOD_NOT_ALLOWED_MESSAGE,
        _ => return response,
    };
    if is_json(response.headers()) {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    let (rendered, body) = error_response(parts.status, &ErrorBody::new(message)).into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    if let Some(content_type) = rendered.headers.get(header::CONTENT_TYPE) {
        parts.headers.insert(header::CONTENT_TYPE, content_type.clone());
    }
    Response::from_parts(parts, body)
}
