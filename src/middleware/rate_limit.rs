use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::ApiError;
use crate::limiter::RateLimiterRegistry;

/// Per-client token bucket gate, keyed by the peer IP of the connection.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiterRegistry>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !limiter.enabled() {
        return Ok(next.run(request).await);
    }

    let ip = peer
        .map(|ConnectInfo(addr)| addr.ip())
        .ok_or_else(|| ApiError::internal(anyhow::anyhow!("peer address missing from request")))?;

    if !limiter.allow(ip) {
        tracing::debug!(%ip, "rate limit exceeded");
        return Err(ApiError::rate_limited());
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimiterConfig;
    use axum::{
        body::Body,
        extract::connect_info::MockConnectInfo,
        http::StatusCode,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn limiter(enabled: bool) -> Arc<RateLimiterRegistry> {
        Arc::new(RateLimiterRegistry::new(LimiterConfig {
            enabled,
            requests_per_second: 0.001,
            burst: 2,
            sweep_interval_secs: 60,
        }))
    }

    fn app(limiter: Arc<RateLimiterRegistry>) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
    }

    fn get_root() -> Request {
        axum::http::Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn rejects_once_burst_is_spent() {
        let app = app(limiter(true)).layer(MockConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000))));

        for _ in 0..2 {
            let response = app.clone().oneshot(get_root()).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.clone().oneshot(get_root()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn disabled_limiter_passes_through() {
        let app = app(limiter(false)).layer(MockConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000))));
        for _ in 0..5 {
            let response = app.clone().oneshot(get_root()).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn missing_peer_address_is_internal() {
        let response = app(limiter(true)).oneshot(get_root()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
