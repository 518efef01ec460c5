use axum::{
    Router,
    http::{HeaderValue, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health_handler, metrics_handler, preflight_handler, proxy_handler};
use crate::state::AppState;

pub const PROXY_PATH: &str = "/api/proxy";

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(PROXY_PATH, post(proxy_handler).options(preflight_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // outermost, so rejections and fallbacks carry them too
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
}
