// src/main.rs
//! GPS Streamer - NMEA batch ingest service for GL.iNet routers
//!
//! ```bash
//! # Defaults: 0.0.0.0:9999, InfluxDB at http://localhost:8086
//! gps-streamer
//!
//! # Custom config file and port
//! gps-streamer --config /etc/gps-streamer.json --port 8099
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use gps_streamer::{
    server::{self, AppState},
    storage::{InfluxClient, PointSink},
    ServiceConfig, StatsRegister,
};
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// GL.iNet GPS Streamer
#[derive(Parser, Debug)]
#[command(name = "gps-streamer")]
#[command(about = "Receive NMEA batches over HTTP and store them in InfluxDB")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/gps-streamer/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// HTTP server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<ServiceConfig> {
    let mut config = match &args.config {
        Some(path) => ServiceConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServiceConfig::load().context("loading default config")?,
    };

    config.apply_env().context("applying environment overrides")?;

    if let Some(bind) = &args.bind {
        config.host = bind.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // Setup logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_filter()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting GL.iNet GPS Streamer Service v{}", env!("CARGO_PKG_VERSION"));

    let client = InfluxClient::new(&config.influxdb)?;
    info!("InfluxDB: {} (org {}, bucket {})", config.influxdb.url, config.influxdb.org, config.influxdb.bucket);

    match client.health().await {
        Ok(health) if health.is_pass() => info!("InfluxDB connection healthy"),
        Ok(health) => warn!(
            "InfluxDB health: {} {}",
            health.status,
            health.message.as_deref().unwrap_or_default()
        ),
        Err(e) => bail!("Failed to connect to InfluxDB: {}", e),
    }

    let stats = Arc::new(StatsRegister::new());
    let state = Arc::new(AppState::new(stats, Arc::new(client)));

    server::serve(&config, state).await?;
    Ok(())
}
