// src/server/handlers.rs
//! HTTP request handlers

use super::AppState;
use crate::{
    batch::{self, BatchOutcome, TypeTally},
    error::StreamerError,
};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, error, info, warn};

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: u16,
}

impl ApiError {
    pub fn new(code: u16, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<StreamerError> for ApiError {
    fn from(err: StreamerError) -> Self {
        match err {
            StreamerError::EmptyBatch => Self::new(400, err.to_string()),
            StreamerError::Write(_) => Self::new(500, "Database write failed"),
            other => Self::new(500, other.to_string()),
        }
    }
}

/// Response body of `POST /gps`
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub sentences_processed: usize,
    pub points_written: usize,
    pub batch_summary: String,
    pub sentence_types: TypeTally,
    pub parsed_counts: TypeTally,
    pub skipped_counts: TypeTally,
    pub measurement_types: BTreeMap<&'static str, usize>,
}

impl IngestResponse {
    fn from_outcome(sentences_processed: usize, outcome: &BatchOutcome) -> Self {
        Self {
            status: "success",
            sentences_processed,
            points_written: outcome.points.len(),
            batch_summary: outcome.batch_summary(),
            sentence_types: outcome.type_tally.clone(),
            parsed_counts: outcome.parsed_counts(),
            skipped_counts: outcome.skipped_counts(),
            measurement_types: outcome.measurement_types(),
        }
    }
}

/// POST /gps - ingest a raw NMEA batch
pub async fn receive_gps(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    let sentences = batch::split_lines(&body);
    if sentences.is_empty() {
        return Err(StreamerError::EmptyBatch.into());
    }

    debug!("Raw data: {} bytes", body.len());
    info!("Received {} NMEA sentences", sentences.len());

    let outcome = state.processor.process(&sentences);
    log_outcome(sentences.len(), &outcome);

    if outcome.points.is_empty() {
        warn!("No valid GPS data points to write");
    } else {
        state.sink.write(&outcome.points).await.map_err(|e| {
            error!("InfluxDB write failed: {}", e);
            ApiError::from(e)
        })?;
        state.stats().add_written(outcome.points.len());
        info!("Wrote {} points to InfluxDB", outcome.points.len());
    }

    Ok(Json(IngestResponse::from_outcome(sentences.len(), &outcome)))
}

fn log_outcome(total: usize, outcome: &BatchOutcome) {
    info!(
        "Batch: {} total, {} parsed, {} skipped",
        total,
        outcome.points.len(),
        outcome.skipped_types.len()
    );
    info!("Types: [{}]", outcome.batch_summary());

    let parsed = outcome.parsed_counts();
    if !parsed.is_empty() {
        info!("Parsed: [{}]", batch::summarize(&parsed));
    }

    let skipped = outcome.skipped_counts();
    if !skipped.is_empty() {
        info!("Skipped: [{}]", batch::summarize(&skipped));
    }

    for (category, count) in outcome.measurement_types() {
        info!("{}: {} points", category, count);
    }
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.stats().snapshot();

    match state.sink.health().await {
        Ok(health) => {
            let connected = health.is_pass();
            Json(json!({
                "status": if connected { "healthy" } else { "unhealthy" },
                "influxdb": if connected { "connected" } else { "disconnected" },
                "stats": stats,
            }))
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            Json(json!({
                "status": "unhealthy",
                "influxdb": "disconnected",
                "error": e.to_string(),
                "stats": stats,
            }))
        }
    }
}

/// GET /stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!(state.stats().snapshot()))
}

/// POST /debug - show how a raw body is laid out
pub async fn debug_raw_data(body: Bytes) -> Json<Value> {
    let text = String::from_utf8_lossy(&body);
    let preview: String = text.chars().take(300).collect();

    let first_lines: Vec<&str> = if text.contains('\n') {
        text.split('\n').take(3).collect()
    } else {
        vec!["No LF found"]
    };

    Json(json!({
        "raw_length": body.len(),
        "decoded_length": text.chars().count(),
        "raw_preview": format!("{:?}", preview),
        "contains_cr": text.contains('\r'),
        "contains_lf": text.contains('\n'),
        "contains_crlf": text.contains("\r\n"),
        "line_count_split_n": text.split('\n').count(),
        "line_count_split_rn": text.split("\r\n").count(),
        "first_3_lines": first_lines,
    }))
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "GL.iNet GPS Streamer",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}
