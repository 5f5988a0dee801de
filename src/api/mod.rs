pub mod error;
pub mod health;
pub mod optimise;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tokio::sync::Semaphore;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;

/// Shared handler state: configuration plus the solver permit pool that
/// serializes access to the backend.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub solver_permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let permits = config.solver.max_concurrent_solves.max(1);
        Self {
            config: Arc::new(config),
            solver_permits: Arc::new(Semaphore::new(permits)),
        }
    }
}

pub fn router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/api/v1/optimise", post(optimise::optimise_battery))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(64 * 1024))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.server.request_timeout_secs),
                )),
        )
        .layer(TraceLayer::new_for_http())
}
