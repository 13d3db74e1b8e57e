pub mod backend;
pub mod client;
pub mod config;
pub mod decoder;
pub mod dialect;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod router;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{any, get},
    Router,
};
use backend::http::HttpTransport;
use config::BridgeConfig;
use tracing::info;

pub fn build_state(config: &BridgeConfig) -> Result<state::AppState, std::io::Error> {
    let transport = HttpTransport::from_config(config).map_err(std::io::Error::other)?;
    let state = state::AppState::new(config, Arc::new(transport));
    info!(
        origin = %state.router.backend().origin(),
        base_path = state.router.backend().base_path(),
        dialect = ?state.router.preference(),
        "backend configured"
    );
    Ok(state)
}

pub fn build_app(state: state::AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::metrics))
        .route("/api/*rest", any(handlers::proxy))
        .route("/v1/*rest", any(handlers::proxy))
        .with_state(state)
}
