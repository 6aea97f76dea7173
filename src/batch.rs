// src/batch.rs
//! Sentence tokenizing and batch processing

use crate::{
    gps::{
        data::MeasurementPoint,
        nmea::{self, SentenceKind},
        points::BuildContext,
    },
    stats::StatsRegister,
};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, warn};

/// Skip reason for lines that are empty or lack a leading `$`
pub const INVALID: &str = "invalid";

/// Skip reason for lines that still contain a line terminator
pub const EMBEDDED_NEWLINES: &str = "embedded-newlines";

/// Split a raw body into trimmed, non-empty lines.
///
/// `\r\n` and bare `\r` are treated as `\n`. Invalid UTF-8 is replaced
/// rather than rejected, so one corrupt line does not sink the batch.
pub fn split_lines(raw: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(raw);
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    normalized
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract candidate NMEA sentences (lines starting with `$`) from a raw body
pub fn tokenize(raw: &[u8]) -> Vec<String> {
    split_lines(raw)
        .into_iter()
        .filter(|line| line.starts_with('$'))
        .collect()
}

/// What happened to a single routed sentence
#[derive(Debug)]
pub enum Routed {
    Point(MeasurementPoint),
    /// Decoded fine but carried nothing worth storing
    Empty,
    /// Failed checksum, address or length checks
    Malformed,
    NoParser,
}

/// Per-type counts, kept in the order each type was first seen
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TypeTally {
    entries: Vec<(String, usize)>,
}

impl TypeTally {
    pub fn add(&mut self, key: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((key.to_string(), 1)),
        }
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, count)| (k.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}

impl<'a> FromIterator<&'a String> for TypeTally {
    fn from_iter<I: IntoIterator<Item = &'a String>>(keys: I) -> Self {
        let mut tally = TypeTally::default();
        for key in keys {
            tally.add(key);
        }
        tally
    }
}

// Serialized as a JSON object in first-seen order
impl Serialize for TypeTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Result of processing one batch
#[derive(Debug, Default, Clone)]
pub struct BatchOutcome {
    pub points: Vec<MeasurementPoint>,
    /// Type key of every built point, in point order
    pub parsed_types: Vec<String>,
    /// Type key or skip reason of every sentence that produced no point
    pub skipped_types: Vec<String>,
    pub type_tally: TypeTally,
}

impl BatchOutcome {
    pub fn parsed_counts(&self) -> TypeTally {
        self.parsed_types.iter().collect()
    }

    /// Skipped sentences per type key, leaving out `invalid` and `embedded-newlines`
    pub fn skipped_counts(&self) -> TypeTally {
        self.skipped_types
            .iter()
            .filter(|reason| reason.as_str() != INVALID && reason.as_str() != EMBEDDED_NEWLINES)
            .collect()
    }

    /// Compact tally such as `GGA:2 GSV:3`, or `EMPTY`
    pub fn batch_summary(&self) -> String {
        summarize(&self.type_tally)
    }

    /// Built points per measurement category
    pub fn measurement_types(&self) -> BTreeMap<&'static str, usize> {
        let mut categories = BTreeMap::new();
        for key in &self.parsed_types {
            if let Some(kind) = SentenceKind::from_type_key(key) {
                *categories.entry(kind.measurement().category()).or_insert(0) += 1;
            }
        }
        categories
    }
}

/// Drop the `$GP`/`$GN`/`$GL` talker prefix for display
pub fn short_type(key: &str) -> &str {
    ["$GP", "$GN", "$GL"]
        .iter()
        .find_map(|prefix| key.strip_prefix(prefix))
        .unwrap_or(key)
}

/// Render a tally as `GGA:2 RMC:1`, or `EMPTY` when there is nothing
pub fn summarize(counts: &TypeTally) -> String {
    if counts.is_empty() {
        return "EMPTY".to_string();
    }
    counts
        .iter()
        .map(|(key, count)| format!("{}:{}", short_type(key), count))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drives decoding and point building over a batch of sentences
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    stats: Arc<StatsRegister>,
}

impl BatchProcessor {
    pub fn new(stats: Arc<StatsRegister>) -> Self {
        Self { stats }
    }

    pub fn stats(&self) -> &StatsRegister {
        &self.stats
    }

    /// Process a batch, stamping every point with the current time
    pub fn process<S: AsRef<str>>(&self, sentences: &[S]) -> BatchOutcome {
        self.process_at(sentences, Utc::now())
    }

    /// Process a batch with an explicit capture time
    pub fn process_at<S: AsRef<str>>(&self, sentences: &[S], captured_at: DateTime<Utc>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        self.stats.add_received(sentences.len());

        for sentence in sentences {
            let sentence = sentence.as_ref().trim();
            if sentence.is_empty() || !sentence.starts_with('$') {
                outcome.skipped_types.push(INVALID.to_string());
                continue;
            }

            if sentence.contains('\n') || sentence.contains('\r') {
                outcome.skipped_types.push(EMBEDDED_NEWLINES.to_string());
                continue;
            }

            let key = nmea::type_key(sentence);
            outcome.type_tally.add(key);

            match self.route(sentence, key, captured_at) {
                Routed::Point(point) => {
                    outcome.points.push(point);
                    outcome.parsed_types.push(key.to_string());
                }
                Routed::Empty | Routed::Malformed | Routed::NoParser => {
                    outcome.skipped_types.push(key.to_string())
                }
            }
        }

        outcome
    }

    /// Decode a sentence and build its point. Unroutable keys never reach the decoder.
    pub fn route(&self, sentence: &str, key: &str, captured_at: DateTime<Utc>) -> Routed {
        let Some(kind) = SentenceKind::from_type_key(key) else {
            debug!("Skipping {}: no parser available", key);
            return Routed::NoParser;
        };

        let decoded = match nmea::decode(kind, sentence) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("NMEA parse error for {}: {}", key, e);
                return Routed::Malformed;
            }
        };

        let ctx = BuildContext {
            captured_at,
            type_key: key,
            stats: &self.stats,
        };

        match (kind.builder())(&decoded, &ctx) {
            Some(point) => {
                self.stats.add_parsed(1);
                debug!("Parsed {} successfully", key);
                Routed::Point(point)
            }
            None => {
                debug!("{} parser returned no point (empty/invalid data)", key);
                Routed::Empty
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::data::Measurement;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
    const GSV: &str = "$GPGSV,2,1,08,01,40,083,46,02,17,308,41,12,07,344,39,14,22,228,45*75";
    const GSA_EMPTY: &str = "$GPGSA,,,,,,,,,,,,,,,,,*6E";
    const VTG: &str = "$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K*48";
    const ZDA: &str = "$GPZDA,201530.00,04,07,2002,00,00*60";

    fn processor() -> BatchProcessor {
        BatchProcessor::new(Arc::new(StatsRegister::new()))
    }

    #[test]
    fn test_tokenize_mixed_line_endings() {
        let raw = format!("{}\r\n{}\n", GGA, RMC);
        let sentences = tokenize(raw.as_bytes());

        assert_eq!(sentences, vec![GGA.to_string(), RMC.to_string()]);
        assert!(sentences.iter().all(|s| !s.contains('\r') && !s.contains('\n')));
    }

    #[test]
    fn test_tokenize_bare_carriage_returns() {
        let raw = format!("{}\r{}\r\r{}", GGA, VTG, GGA);
        let sentences = tokenize(raw.as_bytes());

        assert_eq!(sentences, vec![GGA.to_string(), VTG.to_string(), GGA.to_string()]);
    }

    #[test]
    fn test_tokenize_yields_nothing() {
        assert!(tokenize(b"").is_empty());
        assert!(tokenize(b"\n\n").is_empty());
        assert!(tokenize(b"notanmeastring").is_empty());
    }

    #[test]
    fn test_split_lines_keeps_invalid_lines() {
        let lines = split_lines(b"  $GPVTG,1  \r\n\r\ngarbage\n");
        assert_eq!(lines, vec!["$GPVTG,1".to_string(), "garbage".to_string()]);
    }

    #[test]
    fn test_split_lines_tolerates_bad_utf8() {
        let mut raw = GGA.as_bytes().to_vec();
        raw.extend_from_slice(b"\n$GP\xff\xfe\n");

        let lines = split_lines(&raw);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], GGA);
    }

    #[test]
    fn test_process_mixed_batch() {
        let processor = processor();
        let batch = [GGA, "garbage", GSV, ZDA, GSA_EMPTY, RMC, VTG];
        let outcome = processor.process(&batch);

        assert_eq!(outcome.points.len(), 4);
        assert_eq!(outcome.parsed_types, vec!["$GPGGA", "$GPGSV", "$GPRMC", "$GPVTG"]);
        assert_eq!(outcome.skipped_types, vec![INVALID, "$GPZDA", "$GPGSA"]);
        assert_eq!(outcome.type_tally.len(), 6);
        assert!(outcome.type_tally.get(INVALID).is_none());

        let measurements: Vec<_> = outcome.points.iter().map(|p| p.measurement).collect();
        assert_eq!(
            measurements,
            vec![
                Measurement::Position,
                Measurement::Satellites,
                Measurement::Position,
                Measurement::Navigation
            ]
        );
    }

    #[test]
    fn test_every_candidate_lands_in_one_bucket() {
        let processor = processor();
        let batch = [GGA, GGA, "", "nope", ZDA, GSA_EMPTY, "$GPGGA,bad*00", "$GP\nGGA", VTG];
        let outcome = processor.process(&batch);

        let recognized = batch
            .iter()
            .map(|s| s.trim())
            .filter(|s| s.starts_with('$') && !s.contains('\n') && !s.contains('\r'))
            .count();
        let skipped_by_type = outcome.skipped_counts().total();

        assert_eq!(outcome.parsed_types.len() + skipped_by_type, recognized);
        assert_eq!(outcome.parsed_types.len() + outcome.skipped_types.len(), batch.len());
        assert_eq!(
            outcome.skipped_types.iter().filter(|s| s.as_str() == EMBEDDED_NEWLINES).count(),
            1
        );
        assert_eq!(outcome.skipped_types.iter().filter(|s| s.as_str() == INVALID).count(), 2);
    }

    #[test]
    fn test_points_share_capture_time() {
        let processor = processor();
        let captured_at = Utc::now();
        let outcome = processor.process_at(&[GGA, GSV, VTG], captured_at);

        assert!(outcome.points.iter().all(|p| p.timestamp == captured_at));
    }

    #[test]
    fn test_unroutable_sentence_skips_decoder() {
        let processor = processor();
        // Broken checksum would fail decoding if the decoder were reached
        let routed = processor.route("$GPZDA,garbage*ZZ", "$GPZDA", Utc::now());
        assert!(matches!(routed, Routed::NoParser));
    }

    #[test]
    fn test_decode_failure_is_skipped() {
        let processor = processor();
        let bad = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*00";
        let outcome = processor.process(&[bad, VTG]);

        assert_eq!(outcome.skipped_types, vec!["$GPGGA"]);
        assert_eq!(outcome.parsed_types, vec!["$GPVTG"]);
        assert!(matches!(processor.route(bad, "$GPGGA", Utc::now()), Routed::Malformed));
    }

    #[test]
    fn test_counters_repeat_for_same_batch() {
        let stats = Arc::new(StatsRegister::new());
        let processor = BatchProcessor::new(Arc::clone(&stats));
        let batch = [GGA, GSV, ZDA, VTG];

        let first = processor.process(&batch);
        let after_first = stats.snapshot();
        let second = processor.process(&batch);
        let after_second = stats.snapshot();

        assert_eq!(first.points.len(), second.points.len());
        assert_eq!(after_first.sentences_parsed, 3);
        assert_eq!(after_second.sentences_parsed, 6);
        assert_eq!(after_second.sentences_received, 8);
    }

    #[test]
    fn test_empty_batch() {
        let processor = processor();
        let outcome = processor.process::<&str>(&[]);

        assert!(outcome.points.is_empty());
        assert_eq!(outcome.batch_summary(), "EMPTY");
        assert!(outcome.measurement_types().is_empty());
    }

    #[test]
    fn test_report_helpers() {
        let processor = processor();
        let outcome = processor.process(&[GGA, GGA, RMC, ZDA, GSA_EMPTY, "junk", VTG]);

        assert_eq!(outcome.batch_summary(), "GGA:2 RMC:1 ZDA:1 GSA:1 VTG:1");

        let parsed = outcome.parsed_counts();
        assert_eq!(parsed.get("$GPGGA"), Some(2));
        assert_eq!(parsed.get("$GPVTG"), Some(1));

        let skipped = outcome.skipped_counts();
        assert_eq!(skipped.get("$GPZDA"), Some(1));
        assert_eq!(skipped.get("$GPGSA"), Some(1));
        assert!(skipped.get(INVALID).is_none());

        let categories = outcome.measurement_types();
        assert_eq!(categories.get("Position"), Some(&3));
        assert_eq!(categories.get("Navigation"), Some(&1));
        assert!(!categories.contains_key("DOP/Precision"));
    }

    #[test]
    fn test_tally_keeps_first_seen_order() {
        let processor = processor();
        let outcome = processor.process(&[VTG, GGA, VTG, ZDA]);

        assert_eq!(outcome.batch_summary(), "VTG:2 GGA:1 ZDA:1");
        assert_eq!(
            serde_json::to_string(&outcome.type_tally).unwrap(),
            r#"{"$GPVTG":2,"$GPGGA":1,"$GPZDA":1}"#
        );
        assert_eq!(outcome.type_tally.total(), 4);
    }

    #[test]
    fn test_short_type() {
        assert_eq!(short_type("$GPGGA"), "GGA");
        assert_eq!(short_type("$GNRMC"), "RMC");
        assert_eq!(short_type("$GLGSV"), "GSV");
        assert_eq!(short_type("$BDGSV"), "$BDGSV");
    }
}
