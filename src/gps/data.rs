// src/gps/data.rs
//! Measurement point structures and field conversion helpers

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Measurement a point is written under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Measurement {
    #[serde(rename = "gps_position")]
    Position,
    #[serde(rename = "satellite_data")]
    Satellites,
    #[serde(rename = "gps_dop_data")]
    Precision,
    #[serde(rename = "gps_navigation_data")]
    Navigation,
}

impl Measurement {
    /// Measurement name as stored in the time-series database
    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::Position => "gps_position",
            Measurement::Satellites => "satellite_data",
            Measurement::Precision => "gps_dop_data",
            Measurement::Navigation => "gps_navigation_data",
        }
    }

    /// Human readable category used in batch reports
    pub fn category(&self) -> &'static str {
        match self {
            Measurement::Position => "Position",
            Measurement::Satellites => "Satellites",
            Measurement::Precision => "DOP/Precision",
            Measurement::Navigation => "Navigation",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that can be stored in a point field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    String(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

/// A named, timestamped bundle of fields destined for storage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementPoint {
    pub measurement: Measurement,
    pub timestamp: DateTime<Utc>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl MeasurementPoint {
    pub fn new(measurement: Measurement, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement,
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Set a field, replacing any previous value for the key
    pub fn field(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field only when a value is present. Returns whether it was added.
    pub fn field_opt<T: Into<FieldValue>>(&mut self, key: impl Into<String>, value: Option<T>) -> bool {
        match value {
            Some(v) => {
                self.field(key, v);
                true
            }
            None => false,
        }
    }

    pub fn get_field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }
}

/// Convert a raw field to a float. Empty or unparsable input is treated as absent.
pub fn parse_float(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Convert a raw field to an integer. Empty or unparsable input is treated as absent.
pub fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<i64>().ok()
}

/// Keep a raw text field only if it is non-empty
pub fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
