// src/error.rs
//! Error types for the GPS streamer

use std::fmt;

pub type Result<T> = std::result::Result<T, StreamerError>;

#[derive(Debug)]
pub enum StreamerError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Http(reqwest::Error),
    Config(String),
    /// Request body carried no data at all
    EmptyBatch,
    /// The storage backend rejected or failed a batch write
    Write(String),
    Other(String),
}

impl fmt::Display for StreamerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamerError::Io(e) => write!(f, "IO error: {}", e),
            StreamerError::Json(e) => write!(f, "JSON error: {}", e),
            StreamerError::Http(e) => write!(f, "HTTP error: {}", e),
            StreamerError::Config(msg) => write!(f, "Config error: {}", msg),
            StreamerError::EmptyBatch => write!(f, "No GPS data received"),
            StreamerError::Write(msg) => write!(f, "Write error: {}", msg),
            StreamerError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for StreamerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamerError::Io(e) => Some(e),
            StreamerError::Json(e) => Some(e),
            StreamerError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StreamerError {
    fn from(error: std::io::Error) -> Self {
        StreamerError::Io(error)
    }
}

impl From<serde_json::Error> for StreamerError {
    fn from(error: serde_json::Error) -> Self {
        StreamerError::Json(error)
    }
}

impl From<reqwest::Error> for StreamerError {
    fn from(error: reqwest::Error) -> Self {
        StreamerError::Http(error)
    }
}

impl From<anyhow::Error> for StreamerError {
    fn from(error: anyhow::Error) -> Self {
        StreamerError::Other(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(StreamerError::EmptyBatch.to_string(), "No GPS data received");
        assert_eq!(
            StreamerError::Write("timeout".to_string()).to_string(),
            "Write error: timeout"
        );
        assert_eq!(
            StreamerError::Config("bad port".to_string()).to_string(),
            "Config error: bad port"
        );
    }

    #[test]
    fn test_from_anyhow() {
        let err: StreamerError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, StreamerError::Other(ref msg) if msg == "boom"));
    }
}
