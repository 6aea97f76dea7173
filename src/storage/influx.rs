// src/storage/influx.rs
//! InfluxDB v2 HTTP client

use super::{line_protocol, HealthStatus, PointSink};
use crate::{
    config::InfluxConfig,
    error::{Result, StreamerError},
    gps::data::MeasurementPoint,
};
use futures::future::BoxFuture;
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Client, Url,
};
use std::time::Duration;
use tracing::debug;

/// Writes points to an InfluxDB v2 bucket with synchronous write semantics
#[derive(Debug, Clone)]
pub struct InfluxClient {
    http: Client,
    write_url: Url,
    health_url: Url,
    token: String,
}

impl InfluxClient {
    pub fn new(config: &InfluxConfig) -> Result<Self> {
        let base = config.url.trim_end_matches('/');

        let write_url = Url::parse_with_params(
            &format!("{}/api/v2/write", base),
            &[
                ("org", config.org.as_str()),
                ("bucket", config.bucket.as_str()),
                ("precision", "ns"),
            ],
        )
        .map_err(|e| StreamerError::Config(format!("Invalid InfluxDB URL {}: {}", config.url, e)))?;

        let health_url = Url::parse(&format!("{}/health", base))
            .map_err(|e| StreamerError::Config(format!("Invalid InfluxDB URL {}: {}", config.url, e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            write_url,
            health_url,
            token: config.token.clone(),
        })
    }

    pub fn write_url(&self) -> &Url {
        &self.write_url
    }

    pub fn health_url(&self) -> &Url {
        &self.health_url
    }

    async fn write_body(&self, body: String) -> Result<()> {
        let response = self
            .http
            .post(self.write_url.clone())
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| StreamerError::Write(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(StreamerError::Write(format!(
                "InfluxDB returned {}: {}",
                status,
                detail.trim()
            )));
        }

        Ok(())
    }

    async fn fetch_health(&self) -> Result<HealthStatus> {
        let response = self.http.get(self.health_url.clone()).send().await?;
        let health = response.json::<HealthStatus>().await?;
        Ok(health)
    }
}

impl PointSink for InfluxClient {
    fn write<'a>(&'a self, points: &'a [MeasurementPoint]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let body = line_protocol::encode_batch(points);
            if body.is_empty() {
                return Ok(());
            }
            debug!("Writing {} bytes of line protocol", body.len());
            self.write_body(body).await
        })
    }

    fn health(&self) -> BoxFuture<'_, Result<HealthStatus>> {
        Box::pin(self.fetch_health())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> InfluxConfig {
        InfluxConfig {
            url: url.to_string(),
            token: "secret".to_string(),
            org: "glinet gps".to_string(),
            bucket: "gps_data".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_urls_built_from_config() {
        let client = InfluxClient::new(&config("http://localhost:8086/")).unwrap();

        assert_eq!(
            client.write_url().as_str(),
            "http://localhost:8086/api/v2/write?org=glinet+gps&bucket=gps_data&precision=ns"
        );
        assert_eq!(client.health_url().as_str(), "http://localhost:8086/health");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = InfluxClient::new(&config("not a url"));
        assert!(matches!(result, Err(StreamerError::Config(_))));
    }

    #[test]
    fn test_health_status_parsing() {
        let body = r#"{"name":"influxdb","message":"ready for queries and writes","status":"pass","checks":[],"version":"v2.7.1","commit":"407fa622e9"}"#;
        let health: HealthStatus = serde_json::from_str(body).unwrap();

        assert!(health.is_pass());
        assert_eq!(health.message.as_deref(), Some("ready for queries and writes"));

        let failing: HealthStatus = serde_json::from_str(r#"{"status":"fail"}"#).unwrap();
        assert!(!failing.is_pass());
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        // Nothing listens on this port; an attempted request would fail
        let client = InfluxClient::new(&config("http://127.0.0.1:9")).unwrap();
        assert!(client.write(&[]).await.is_ok());
    }
}
