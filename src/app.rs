use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::auth::{AuthError, Authenticator};
use crate::config::AppConfig;
use crate::database::{MemoryStore, MovieStore, UserStore};
use crate::handlers::{protected, public};
use crate::limiter::RateLimiterRegistry;
use crate::middleware::{
    authenticate, normalize_errors, rate_limit, record_metrics, recover_panic, request_deadline,
    Metrics,
};

/// Shared per-process state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub movies: Arc<dyn MovieStore>,
    pub users: Arc<dyn UserStore>,
    pub auth: Arc<Authenticator>,
    pub limiter: Arc<RateLimiterRegistry>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        movies: Arc<dyn MovieStore>,
        users: Arc<dyn UserStore>,
    ) -> Result<Self, AuthError> {
        let auth = Authenticator::new(&config.security)?;
        let limiter = RateLimiterRegistry::new(config.limiter.clone());
        Ok(Self {
            config: Arc::new(config),
            movies,
            users,
            auth: Arc::new(auth),
            limiter: Arc::new(limiter),
            metrics: Arc::new(Metrics::new()),
        })
    }

    /// State backed by a fresh [`MemoryStore`] for both movies and users.
    pub fn in_memory(config: AppConfig) -> Result<Self, AuthError> {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store)
    }
}

/// Full application router. Layers, outermost first: panic recovery, tracing,
/// metrics, rate limiting, 404/405 normalization, request deadline.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_request_body_bytes;
    let deadline = state.config.server.request_timeout();

    Router::new()
        .merge(system_routes())
        .merge(auth_routes())
        .merge(user_routes())
        .merge(movie_routes(&state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn_with_state(deadline, request_deadline))
        .layer(from_fn(normalize_errors))
        .layer(from_fn_with_state(state.limiter.clone(), rate_limit))
        .layer(from_fn_with_state(state.metrics.clone(), record_metrics))
        .layer(TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO)))
        .layer(CatchPanicLayer::custom(recover_panic(state.metrics.clone())))
        .with_state(state)
}

fn system_routes() -> Router<AppState> {
    Router::new()
        .route("/healthcheck", get(public::healthcheck))
        .route("/debug/metrics", get(public::metrics))
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/token", post(public::token_create))
}

fn user_routes() -> Router<AppState> {
    Router::new().route("/users", post(public::user_register))
}

fn movie_routes(state: &AppState) -> Router<AppState> {
    let require_auth = || from_fn_with_state(state.auth.clone(), authenticate);

    Router::new()
        .route(
            "/movies",
            get(public::movies_list).merge(post(protected::movie_create).route_layer(require_auth())),
        )
        .route(
            "/movies/:id",
            get(public::movie_get)
                .patch(public::movie_update)
                .merge(delete(protected::movie_delete).route_layer(require_auth())),
        )
}
