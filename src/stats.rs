// src/stats.rs
//! Process-wide ingest statistics

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, PoisonError,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LastPosition {
    pub lat: f64,
    pub lon: f64,
}

/// Point-in-time copy of the counters, as reported by `/stats` and `/health`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub sentences_received: u64,
    pub sentences_parsed: u64,
    pub points_written: u64,
    pub last_position: Option<LastPosition>,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
struct LastFix {
    position: LastPosition,
    updated_at: DateTime<Utc>,
}

/// Counters shared by every in-flight request.
///
/// Counters are atomics; the last fix sits behind a mutex so latitude,
/// longitude and update time always change together. Concurrent batches race
/// on the last fix and the last writer wins.
#[derive(Debug, Default)]
pub struct StatsRegister {
    sentences_received: AtomicU64,
    sentences_parsed: AtomicU64,
    points_written: AtomicU64,
    last_fix: Mutex<Option<LastFix>>,
}

impl StatsRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_received(&self, count: usize) {
        self.sentences_received.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn add_parsed(&self, count: usize) {
        self.sentences_parsed.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn add_written(&self, count: usize) {
        self.points_written.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn set_last_position(&self, lat: f64, lon: f64, timestamp: DateTime<Utc>) {
        let mut guard = self.last_fix.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(LastFix {
            position: LastPosition { lat, lon },
            updated_at: timestamp,
        });
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let last_fix = *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner);

        StatsSnapshot {
            sentences_received: self.sentences_received.load(Ordering::Relaxed),
            sentences_parsed: self.sentences_parsed.load(Ordering::Relaxed),
            points_written: self.points_written.load(Ordering::Relaxed),
            last_position: last_fix.map(|fix| fix.position),
            last_update: last_fix.map(|fix| fix.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_empty() {
        let snapshot = StatsRegister::new().snapshot();

        assert_eq!(snapshot.sentences_received, 0);
        assert_eq!(snapshot.sentences_parsed, 0);
        assert_eq!(snapshot.points_written, 0);
        assert!(snapshot.last_position.is_none());
        assert!(snapshot.last_update.is_none());
    }

    #[test]
    fn test_counters_accumulate() {
        let stats = StatsRegister::new();
        stats.add_received(5);
        stats.add_received(3);
        stats.add_parsed(4);
        stats.add_written(2);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.sentences_received, 8);
        assert_eq!(snapshot.sentences_parsed, 4);
        assert_eq!(snapshot.points_written, 2);
    }

    #[test]
    fn test_last_position_overwrites() {
        let stats = StatsRegister::new();
        let first = Utc::now();
        stats.set_last_position(48.1, 11.5, first);
        let second = first + chrono::Duration::seconds(1);
        stats.set_last_position(49.2, -123.1, second);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.last_position, Some(LastPosition { lat: 49.2, lon: -123.1 }));
        assert_eq!(snapshot.last_update, Some(second));
    }

    #[test]
    fn test_concurrent_increments() {
        let stats = Arc::new(StatsRegister::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.add_received(1);
                        stats.add_parsed(1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.sentences_received, 8000);
        assert_eq!(snapshot.sentences_parsed, 8000);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = StatsRegister::new();
        stats.add_received(1);

        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["sentences_received"], 1);
        assert!(json["last_position"].is_null());
    }
}
