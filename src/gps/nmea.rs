// src/gps/nmea.rs
//! NMEA-0183 sentence decoding
//!
//! Each supported grammar decodes into its own struct. Every optional value is
//! converted once here, so point builders only ever see `Option`s.

use super::data::{non_empty, parse_float, parse_int, Measurement};
use std::fmt;

/// Sentence grammars with a registered point builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentenceKind {
    Gga,
    Rmc,
    Gsv,
    Gsa,
    Vtg,
}

impl SentenceKind {
    pub const ALL: [SentenceKind; 5] = [
        SentenceKind::Gga,
        SentenceKind::Rmc,
        SentenceKind::Gsv,
        SentenceKind::Gsa,
        SentenceKind::Vtg,
    ];

    /// Look up the kind for a six character type key such as `$GPGGA`
    pub fn from_type_key(key: &str) -> Option<Self> {
        match key {
            "$GPGGA" => Some(SentenceKind::Gga),
            "$GPRMC" => Some(SentenceKind::Rmc),
            "$GPGSV" => Some(SentenceKind::Gsv),
            "$GPGSA" => Some(SentenceKind::Gsa),
            "$GPVTG" => Some(SentenceKind::Vtg),
            _ => None,
        }
    }

    pub fn type_key(&self) -> &'static str {
        match self {
            SentenceKind::Gga => "$GPGGA",
            SentenceKind::Rmc => "$GPRMC",
            SentenceKind::Gsv => "$GPGSV",
            SentenceKind::Gsa => "$GPGSA",
            SentenceKind::Vtg => "$GPVTG",
        }
    }

    /// Measurement the sentence's point is written under
    pub fn measurement(&self) -> Measurement {
        match self {
            SentenceKind::Gga | SentenceKind::Rmc => Measurement::Position,
            SentenceKind::Gsv => Measurement::Satellites,
            SentenceKind::Gsa => Measurement::Precision,
            SentenceKind::Vtg => Measurement::Navigation,
        }
    }

    fn address(&self) -> &'static str {
        &self.type_key()[1..]
    }

    /// Data fields a complete sentence carries, not counting optional trailing extensions
    fn min_fields(&self) -> usize {
        match self {
            SentenceKind::Gga => 14,
            SentenceKind::Rmc => 11,
            SentenceKind::Gsv => 3,
            SentenceKind::Gsa => 17,
            SentenceKind::Vtg => 8,
        }
    }
}

/// Routing key of a sentence: its first six characters, e.g. `$GPGGA`
pub fn type_key(sentence: &str) -> &str {
    match sentence.char_indices().nth(6) {
        Some((idx, _)) => &sentence[..idx],
        None => sentence,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    MissingStart,
    MalformedChecksum(String),
    ChecksumMismatch { expected: u8, computed: u8 },
    UnexpectedAddress { expected: &'static str, found: String },
    Truncated { address: &'static str, expected: usize, found: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MissingStart => write!(f, "sentence does not start with '$'"),
            DecodeError::MalformedChecksum(text) => write!(f, "malformed checksum '{}'", text),
            DecodeError::ChecksumMismatch { expected, computed } => write!(
                f,
                "checksum mismatch: sentence says {:02X}, computed {:02X}",
                expected, computed
            ),
            DecodeError::UnexpectedAddress { expected, found } => {
                write!(f, "expected {} sentence, found '{}'", expected, found)
            }
            DecodeError::Truncated { address, expected, found } => write!(
                f,
                "{} sentence truncated: {} fields, need at least {}",
                address, found, expected
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// GGA - Global Positioning System fix data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gga {
    pub time: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fix_quality: Option<i64>,
    pub satellites: Option<i64>,
    pub hdop: Option<f64>,
    pub altitude: Option<f64>,
}

impl Gga {
    fn from_fields(fields: &[&str]) -> Self {
        Self {
            time: non_empty(raw(fields, 0)),
            latitude: parse_coordinate(raw(fields, 1), raw(fields, 2), "N", "S"),
            longitude: parse_coordinate(raw(fields, 3), raw(fields, 4), "E", "W"),
            fix_quality: parse_int(raw(fields, 5)),
            satellites: parse_int(raw(fields, 6)),
            hdop: parse_float(raw(fields, 7)),
            altitude: parse_float(raw(fields, 8)),
        }
    }
}

/// RMC - Recommended minimum specific GNSS data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rmc {
    pub time: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed_knots: Option<f64>,
    pub course: Option<f64>,
}

impl Rmc {
    fn from_fields(fields: &[&str]) -> Self {
        Self {
            time: non_empty(raw(fields, 0)),
            latitude: parse_coordinate(raw(fields, 2), raw(fields, 3), "N", "S"),
            longitude: parse_coordinate(raw(fields, 4), raw(fields, 5), "E", "W"),
            speed_knots: parse_float(raw(fields, 6)),
            course: parse_float(raw(fields, 7)),
        }
    }
}

/// One satellite block of a GSV sentence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SatelliteSlot {
    pub prn: Option<i64>,
    pub elevation: Option<f64>,
    pub azimuth: Option<f64>,
    pub snr: Option<f64>,
}

/// GSV - Satellites in view (up to four per sentence)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gsv {
    pub total_messages: Option<i64>,
    pub message_number: Option<i64>,
    pub satellites_in_view: Option<i64>,
    pub satellites: [SatelliteSlot; 4],
}

impl Gsv {
    fn from_fields(fields: &[&str]) -> Self {
        Self {
            total_messages: parse_int(raw(fields, 0)),
            message_number: parse_int(raw(fields, 1)),
            satellites_in_view: parse_int(raw(fields, 2)),
            satellites: std::array::from_fn(|slot| {
                let base = 3 + slot * 4;
                SatelliteSlot {
                    prn: parse_int(raw(fields, base)),
                    elevation: parse_float(raw(fields, base + 1)),
                    azimuth: parse_float(raw(fields, base + 2)),
                    snr: parse_float(raw(fields, base + 3)),
                }
            }),
        }
    }
}

/// GSA - DOP and active satellites
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gsa {
    pub mode: Option<String>,
    pub fix_type: Option<i64>,
    pub satellite_ids: [Option<i64>; 12],
    pub pdop: Option<f64>,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
    /// NMEA 4.1 GNSS system id
    pub system_id: Option<String>,
}

impl Gsa {
    fn from_fields(fields: &[&str]) -> Self {
        Self {
            mode: non_empty(raw(fields, 0)),
            fix_type: parse_int(raw(fields, 1)),
            satellite_ids: std::array::from_fn(|slot| parse_int(raw(fields, 2 + slot))),
            pdop: parse_float(raw(fields, 14)),
            hdop: parse_float(raw(fields, 15)),
            vdop: parse_float(raw(fields, 16)),
            system_id: non_empty(raw(fields, 17)),
        }
    }
}

/// VTG - Track made good and ground speed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vtg {
    pub true_track: Option<f64>,
    pub magnetic_track: Option<f64>,
    pub speed_knots: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub faa_mode: Option<String>,
}

impl Vtg {
    fn from_fields(fields: &[&str]) -> Self {
        Self {
            true_track: parse_float(raw(fields, 0)),
            magnetic_track: parse_float(raw(fields, 2)),
            speed_knots: parse_float(raw(fields, 4)),
            speed_kmh: parse_float(raw(fields, 6)),
            faa_mode: non_empty(raw(fields, 8)),
        }
    }
}

/// Fields shared by the position-bearing sentences
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionFix {
    pub time: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub fix_quality: Option<i64>,
    pub satellites: Option<i64>,
    pub hdop: Option<f64>,
    pub speed_knots: Option<f64>,
    pub course: Option<f64>,
}

impl From<&Gga> for PositionFix {
    fn from(gga: &Gga) -> Self {
        Self {
            time: gga.time.clone(),
            latitude: gga.latitude,
            longitude: gga.longitude,
            altitude: gga.altitude,
            fix_quality: gga.fix_quality,
            satellites: gga.satellites,
            hdop: gga.hdop,
            ..Default::default()
        }
    }
}

impl From<&Rmc> for PositionFix {
    fn from(rmc: &Rmc) -> Self {
        Self {
            time: rmc.time.clone(),
            latitude: rmc.latitude,
            longitude: rmc.longitude,
            speed_knots: rmc.speed_knots,
            course: rmc.course,
            ..Default::default()
        }
    }
}

/// A decoded sentence of one of the supported grammars
#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    Gga(Gga),
    Rmc(Rmc),
    Gsv(Gsv),
    Gsa(Gsa),
    Vtg(Vtg),
}

impl Sentence {
    /// Position view for GGA and RMC, `None` for every other grammar
    pub fn position_fix(&self) -> Option<PositionFix> {
        match self {
            Sentence::Gga(gga) => Some(PositionFix::from(gga)),
            Sentence::Rmc(rmc) => Some(PositionFix::from(rmc)),
            _ => None,
        }
    }
}

/// Decode a sentence as the given grammar
pub fn decode(kind: SentenceKind, sentence: &str) -> Result<Sentence, DecodeError> {
    let fields = split_fields(kind, sentence)?;

    Ok(match kind {
        SentenceKind::Gga => Sentence::Gga(Gga::from_fields(&fields)),
        SentenceKind::Rmc => Sentence::Rmc(Rmc::from_fields(&fields)),
        SentenceKind::Gsv => Sentence::Gsv(Gsv::from_fields(&fields)),
        SentenceKind::Gsa => Sentence::Gsa(Gsa::from_fields(&fields)),
        SentenceKind::Vtg => Sentence::Vtg(Vtg::from_fields(&fields)),
    })
}

/// Validate framing and checksum, then return the data fields after the address
fn split_fields(kind: SentenceKind, sentence: &str) -> Result<Vec<&str>, DecodeError> {
    let body = sentence.strip_prefix('$').ok_or(DecodeError::MissingStart)?;

    let payload = match body.rfind('*') {
        Some(star) => {
            let expected = parse_checksum(&body[star + 1..])?;
            let payload = &body[..star];
            let computed = checksum(payload);
            if expected != computed {
                return Err(DecodeError::ChecksumMismatch { expected, computed });
            }
            payload
        }
        None => body,
    };

    let mut parts = payload.split(',');
    let address = parts.next().unwrap_or("");
    if address != kind.address() {
        return Err(DecodeError::UnexpectedAddress {
            expected: kind.address(),
            found: address.to_string(),
        });
    }

    let fields: Vec<&str> = parts.collect();
    if fields.len() < kind.min_fields() {
        return Err(DecodeError::Truncated {
            address: kind.address(),
            expected: kind.min_fields(),
            found: fields.len(),
        });
    }

    Ok(fields)
}

fn parse_checksum(text: &str) -> Result<u8, DecodeError> {
    if text.len() != 2 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeError::MalformedChecksum(text.to_string()));
    }
    u8::from_str_radix(text, 16).map_err(|_| DecodeError::MalformedChecksum(text.to_string()))
}

/// XOR of every byte between `$` and `*`
pub fn checksum(payload: &str) -> u8 {
    payload.bytes().fold(0, |acc, b| acc ^ b)
}

/// Field lookup; trailing fields a sender left off read as empty
fn raw<'a>(fields: &[&'a str], index: usize) -> &'a str {
    fields.get(index).copied().unwrap_or("")
}

/// Convert `ddmm.mmmm` plus hemisphere to signed decimal degrees
fn parse_coordinate(value: &str, hemisphere: &str, positive: &str, negative: &str) -> Option<f64> {
    let raw = parse_float(value)?;
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;

    match hemisphere.trim() {
        h if h == positive => Some(decimal),
        h if h == negative => Some(-decimal),
        _ => None,
    }
}
