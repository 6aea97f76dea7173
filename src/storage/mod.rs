// src/storage/mod.rs
//! Storage backends for measurement points

pub mod influx;
pub mod line_protocol;

use crate::{error::Result, gps::data::MeasurementPoint};
use futures::future::BoxFuture;
use serde::Deserialize;

pub use influx::InfluxClient;

/// Health report of a storage backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn is_pass(&self) -> bool {
        self.status == "pass"
    }
}

/// Destination for parsed points
pub trait PointSink: Send + Sync {
    /// Write a whole batch in one call. Either everything is accepted or an
    /// error is returned; there is no partial result and no retry.
    fn write<'a>(&'a self, points: &'a [MeasurementPoint]) -> BoxFuture<'a, Result<()>>;

    fn health(&self) -> BoxFuture<'_, Result<HealthStatus>>;
}
