// src/config.rs
//! Service configuration: JSON file, then environment, then command line

use crate::error::{Result, StreamerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    /// Per-request timeout for writes and health checks
    pub timeout_secs: u64,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            token: "glinet-gps-token".to_string(),
            org: "glinet-gps".to_string(),
            bucket: "gps_data".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub influxdb: InfluxConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9999,
            log_level: "DEBUG".to_string(),
            influxdb: InfluxConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;
        Self::load_from(&path)
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| StreamerError::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| StreamerError::Config(format!("Failed to parse config file {}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Config file path: `$HOME/.config/gps-streamer/config.json`
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| StreamerError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("gps-streamer").join("config.json"))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (environment in production, a map in tests)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("INFLUXDB_URL") {
            self.influxdb.url = url;
        }
        if let Some(token) = lookup("INFLUXDB_TOKEN") {
            self.influxdb.token = token;
        }
        if let Some(org) = lookup("INFLUXDB_ORG") {
            self.influxdb.org = org;
        }
        if let Some(bucket) = lookup("INFLUXDB_BUCKET") {
            self.influxdb.bucket = bucket;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(host) = lookup("GPS_STREAMER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("GPS_STREAMER_PORT") {
            self.port = port
                .parse()
                .map_err(|_| StreamerError::Config(format!("Invalid GPS_STREAMER_PORT: {}", port)))?;
        }
        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Log level as a tracing filter directive. Accepts Python-style names
    /// such as `WARNING` and `CRITICAL`.
    pub fn log_filter(&self) -> String {
        match self.log_level.to_ascii_lowercase().as_str() {
            "warning" => "warn".to_string(),
            "critical" | "fatal" => "error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();

        assert_eq!(config.bind_addr(), "0.0.0.0:9999");
        assert_eq!(config.influxdb.url, "http://localhost:8086");
        assert_eq!(config.influxdb.bucket, "gps_data");
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("INFLUXDB_URL", "http://influx:8086"),
            ("INFLUXDB_BUCKET", "routers"),
            ("LOG_LEVEL", "WARNING"),
            ("GPS_STREAMER_PORT", "8080"),
        ]
        .into_iter()
        .collect();

        let mut config = ServiceConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.influxdb.url, "http://influx:8086");
        assert_eq!(config.influxdb.bucket, "routers");
        assert_eq!(config.influxdb.org, "glinet-gps");
        assert_eq!(config.log_filter(), "warn");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = ServiceConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "GPS_STREAMER_PORT").then(|| "not-a-port".to_string())
        });

        assert!(matches!(result, Err(StreamerError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::load_from(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"port": 7000, "influxdb": {"bucket": "test"}}"#).unwrap();

        let config = ServiceConfig::load_from(&path).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.influxdb.bucket, "test");
        assert_eq!(config.influxdb.token, "glinet-gps-token");
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(ServiceConfig::load_from(&path), Err(StreamerError::Config(_))));
    }
}
