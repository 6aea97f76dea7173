// src/lib.rs
//! GPS Streamer Library
//!
//! Receives raw NMEA-0183 batches over HTTP, decodes the GGA, RMC, GSV,
//! GSA and VTG sentences into measurement points and writes them to
//! InfluxDB v2.

pub mod batch;
pub mod config;
pub mod error;
pub mod gps;
pub mod server;
pub mod stats;
pub mod storage;

// Re-export main types for convenience
pub use batch::{tokenize, BatchOutcome, BatchProcessor};
pub use config::ServiceConfig;
pub use error::{Result, StreamerError};
pub use gps::data::MeasurementPoint;
pub use stats::StatsRegister;
