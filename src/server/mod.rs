// src/server/mod.rs
//! HTTP ingest server
//!
//! Endpoints:
//!
//! - `POST /gps` - raw NMEA batch
//! - `GET /health` - storage connectivity plus stats
//! - `GET /stats` - ingest counters
//! - `POST /debug` - line-ending diagnostics for a raw body
//! - `GET /` - service info

pub mod handlers;
pub mod routes;

use crate::{
    batch::BatchProcessor,
    config::ServiceConfig,
    error::Result,
    stats::StatsRegister,
    storage::PointSink,
};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
pub struct AppState {
    pub processor: BatchProcessor,
    pub sink: Arc<dyn PointSink>,
}

impl AppState {
    pub fn new(stats: Arc<StatsRegister>, sink: Arc<dyn PointSink>) -> Self {
        Self {
            processor: BatchProcessor::new(stats),
            sink,
        }
    }

    pub fn stats(&self) -> &StatsRegister {
        self.processor.stats()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(config: &ServiceConfig, state: Arc<AppState>) -> Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("HTTP server: http://{}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down GL.iNet GPS Streamer Service");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
