// src/server/routes.rs
//! Route definitions

use super::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/gps", post(handlers::receive_gps))
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        .route("/debug", post(handlers::debug_raw_data))
}
