pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .route("/api/v1/resume/parse", post(handlers::handle_parse_resume))
        .route("/api/v1/match", post(handlers::handle_match))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
