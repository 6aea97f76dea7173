// src/storage/line_protocol.rs
//! InfluxDB v2 line protocol encoding
//!
//! ```text
//! measurement field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use crate::gps::data::{FieldValue, MeasurementPoint};

/// Format a field value: floats as-is, integers suffixed with `i`, strings quoted
pub fn format_field_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{}", v),
        FieldValue::Integer(v) => format!("{}i", v),
        FieldValue::String(v) => {
            let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{}\"", escaped)
        }
    }
}

/// Encode one point as a line. Returns `None` for a point without fields,
/// which InfluxDB would reject.
pub fn encode_point(point: &MeasurementPoint) -> Option<String> {
    if !point.has_fields() {
        return None;
    }

    let mut line = escape_measurement(point.measurement.as_str());
    line.push(' ');
    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&format_field_value(value));
    }

    if let Some(ns) = point.timestamp.timestamp_nanos_opt() {
        line.push(' ');
        line.push_str(&ns.to_string());
    }

    Some(line)
}

/// Encode a batch as a newline separated request body
pub fn encode_batch(points: &[MeasurementPoint]) -> String {
    points
        .iter()
        .filter_map(encode_point)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Spaces and commas are escaped in measurement names
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Commas, equals signs and spaces are escaped in field keys
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}
