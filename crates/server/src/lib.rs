pub mod handler;
pub mod middleware;

use axum::Router;
use lantern_core::config::Config;
use lantern_core::pipeline::Pipeline;
use middleware::request_logging::RequestLoggingLayer;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
}

pub fn build_router(state: AppState) -> Router {
    let request_logger = state.pipeline.logger("request");

    Router::new()
        .route("/health", axum::routing::get(handler::health::health))
        .layer(RequestLoggingLayer::new(request_logger))
        .with_state(state)
}
