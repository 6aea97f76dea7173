// src/gps/points.rs
//! Point builders: decoded sentences to measurement points
//!
//! Every builder records the sentence type key in the `source_sentence`
//! field and returns `None` when no other field could be populated.

use super::data::{Measurement, MeasurementPoint};
use super::nmea::{Sentence, SentenceKind};
use crate::stats::StatsRegister;
use chrono::{DateTime, Utc};
use tracing::debug;

const KNOTS_TO_MPH: f64 = 1.15078;
const KNOTS_TO_KMH: f64 = 1.852;

pub const SOURCE_SENTENCE_FIELD: &str = "source_sentence";

/// Per-batch inputs shared by every builder call
pub struct BuildContext<'a> {
    pub captured_at: DateTime<Utc>,
    pub type_key: &'a str,
    pub stats: &'a StatsRegister,
}

pub type PointBuilder = fn(&Sentence, &BuildContext<'_>) -> Option<MeasurementPoint>;

impl SentenceKind {
    /// Builder responsible for this sentence kind
    pub fn builder(&self) -> PointBuilder {
        match self {
            SentenceKind::Gga | SentenceKind::Rmc => position_point,
            SentenceKind::Gsv => satellite_point,
            SentenceKind::Gsa => dop_point,
            SentenceKind::Vtg => navigation_point,
        }
    }
}

/// Build a `gps_position` point from GGA or RMC. Requires latitude and longitude.
pub fn position_point(sentence: &Sentence, ctx: &BuildContext<'_>) -> Option<MeasurementPoint> {
    let fix = sentence.position_fix()?;
    let (lat, lon) = (fix.latitude?, fix.longitude?);

    let mut point = MeasurementPoint::new(Measurement::Position, ctx.captured_at);
    point.field("latitude", lat).field("longitude", lon);

    point.field_opt("altitude", fix.altitude);
    point.field_opt("fix_quality", fix.fix_quality);
    point.field_opt("satellites", fix.satellites);
    point.field_opt("hdop", fix.hdop);
    point.field_opt("speed_knots", fix.speed_knots);
    point.field_opt("course", fix.course);
    point.field_opt("gps_time", fix.time);

    // Zero knots is a real reading and still gets converted
    if let Some(knots) = fix.speed_knots {
        point
            .field("speed_mph", knots * KNOTS_TO_MPH)
            .field("speed_kmh", knots * KNOTS_TO_KMH);
    }

    point.field(SOURCE_SENTENCE_FIELD, ctx.type_key);
    ctx.stats.set_last_position(lat, lon, ctx.captured_at);

    debug!("Position point: {} lat={:.6}, lon={:.6}", ctx.type_key, lat, lon);
    Some(point)
}

/// Build a `satellite_data` point from GSV
pub fn satellite_point(sentence: &Sentence, ctx: &BuildContext<'_>) -> Option<MeasurementPoint> {
    let Sentence::Gsv(gsv) = sentence else {
        return None;
    };

    let mut point = MeasurementPoint::new(Measurement::Satellites, ctx.captured_at);
    point.field_opt("total_messages", gsv.total_messages);
    point.field_opt("message_number", gsv.message_number);
    point.field_opt("satellites_in_view", gsv.satellites_in_view);

    let mut processed = 0usize;
    for slot in &gsv.satellites {
        let Some(prn) = slot.prn.filter(|prn| *prn > 0) else {
            continue;
        };

        point.field(format!("sat_{}_prn", prn), prn);
        point.field_opt(format!("sat_{}_elevation", prn), slot.elevation);
        point.field_opt(format!("sat_{}_azimuth", prn), slot.azimuth);
        point.field_opt(format!("sat_{}_snr", prn), slot.snr);
        processed += 1;
    }

    if processed > 0 {
        point.field("satellites_processed", processed);
    }

    finish(point, ctx.type_key)
}

/// Build a `gps_dop_data` point from GSA
pub fn dop_point(sentence: &Sentence, ctx: &BuildContext<'_>) -> Option<MeasurementPoint> {
    let Sentence::Gsa(gsa) = sentence else {
        return None;
    };

    let mut point = MeasurementPoint::new(Measurement::Precision, ctx.captured_at);
    point.field_opt("mode", gsa.mode.clone());
    point.field_opt("fix_type", gsa.fix_type.filter(|fix| *fix > 0));

    let mut active = Vec::new();
    for (slot, id) in gsa.satellite_ids.iter().copied().enumerate() {
        if let Some(id) = id.filter(|id| *id > 0) {
            point.field(format!("active_sat_{}", slot + 1), id);
            active.push(id.to_string());
        }
    }

    if !active.is_empty() {
        point
            .field("active_satellites_count", active.len())
            .field("active_satellites_list", active.join(","));
    }

    point.field_opt("pdop", gsa.pdop);
    point.field_opt("hdop", gsa.hdop);
    point.field_opt("vdop", gsa.vdop);
    point.field_opt("system_id", gsa.system_id.clone());

    finish(point, ctx.type_key)
}

/// Build a `gps_navigation_data` point from VTG
pub fn navigation_point(sentence: &Sentence, ctx: &BuildContext<'_>) -> Option<MeasurementPoint> {
    let Sentence::Vtg(vtg) = sentence else {
        return None;
    };

    let mut point = MeasurementPoint::new(Measurement::Navigation, ctx.captured_at);
    point.field_opt("true_track_degrees", vtg.true_track);
    point.field_opt("magnetic_track_degrees", vtg.magnetic_track);
    point.field_opt("speed_knots", vtg.speed_knots);
    point.field_opt("speed_kmh", vtg.speed_kmh);
    point.field_opt("faa_mode", vtg.faa_mode.clone());

    finish(point, ctx.type_key)
}

/// Drop the point if no field was populated, otherwise stamp its source sentence
fn finish(mut point: MeasurementPoint, type_key: &str) -> Option<MeasurementPoint> {
    if !point.has_fields() {
        return None;
    }
    point.field(SOURCE_SENTENCE_FIELD, type_key);
    Some(point)
}
