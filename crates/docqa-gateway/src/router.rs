use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::map_response;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::error::json_error_bodies;
use super::handlers::{ask_handler, health_handler, upload_handler};
use super::server::AppState;

/// Routes of the service. Request bodies are capped at `max_body_size` bytes.
/// Every error response, including layer and fallback rejections, has a JSON body.
pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        .route("/upload", post(upload_handler))
        .route("/upload/", post(upload_handler))
        .route("/ask/{session_id}", get(ask_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(map_response(json_error_bodies))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
