// handlers/public/health.rs - GET /healthcheck, GET /debug/metrics

use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, MetricsSnapshot};

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub environment: &'static str,
    pub version: &'static str,
}

/// Reports `available` once storage answers a ping; an unreachable store is a 500.
pub async fn healthcheck(State(state): State<AppState>) -> ApiResult<HealthReport> {
    state.movies.ping().await?;

    Ok(ApiResponse::success(HealthReport {
        status: "available",
        environment: state.config.environment.as_str(),
        version: env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> ApiResult<MetricsSnapshot> {
    Ok(ApiResponse::success(state.metrics.snapshot()))
}
