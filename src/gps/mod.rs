// src/gps/mod.rs
//! NMEA decoding and measurement point construction

pub mod data;
pub mod nmea;
pub mod points;

pub use data::{FieldValue, Measurement, MeasurementPoint};
pub use nmea::{DecodeError, Sentence, SentenceKind};
