//! Collection statistics.
//!
//! Counts what the collector has done: events seen per stream, samples
//! recorded, windows completed, and upload outcomes. Only counters are ever
//! persisted, never sample data.

use crate::collector::types::StreamKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running counters for the current process.
#[derive(Debug)]
pub struct CollectionLog {
    /// Accelerometer events received
    accel_events: AtomicU64,
    /// Gyroscope events received
    gyro_events: AtomicU64,
    /// Samples appended to a window
    samples_recorded: AtomicU64,
    /// Windows that reached capacity
    windows_completed: AtomicU64,
    uploads_attempted: AtomicU64,
    uploads_succeeded: AtomicU64,
    uploads_failed: AtomicU64,
    /// Submissions cancelled or reset before the transport answered
    uploads_abandoned: AtomicU64,
    /// Process start time
    started_at: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl CollectionLog {
    pub fn new() -> Self {
        Self {
            accel_events: AtomicU64::new(0),
            gyro_events: AtomicU64::new(0),
            samples_recorded: AtomicU64::new(0),
            windows_completed: AtomicU64::new(0),
            uploads_attempted: AtomicU64::new(0),
            uploads_succeeded: AtomicU64::new(0),
            uploads_failed: AtomicU64::new(0),
            uploads_abandoned: AtomicU64::new(0),
            started_at: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that continues from, and saves to, `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous collection stats: {e}");
        }

        log
    }

    pub fn record_event(&self, kind: StreamKind) {
        match kind {
            StreamKind::Accelerometer => self.accel_events.fetch_add(1, Ordering::Relaxed),
            StreamKind::Gyroscope => self.gyro_events.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_sample(&self) {
        self.samples_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_window_completed(&self) {
        self.windows_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload_attempt(&self) {
        self.uploads_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload_result(&self, success: bool) {
        if success {
            self.uploads_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.uploads_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count an attempt whose outcome was never applied to its window.
    pub fn record_upload_abandoned(&self) {
        self.uploads_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> CollectionStats {
        CollectionStats {
            accel_events: self.accel_events.load(Ordering::Relaxed),
            gyro_events: self.gyro_events.load(Ordering::Relaxed),
            samples_recorded: self.samples_recorded.load(Ordering::Relaxed),
            windows_completed: self.windows_completed.load(Ordering::Relaxed),
            uploads_attempted: self.uploads_attempted.load(Ordering::Relaxed),
            uploads_succeeded: self.uploads_succeeded.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
            uploads_abandoned: self.uploads_abandoned.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Collection Statistics:\n\
             - Accelerometer events: {}\n\
             - Gyroscope events: {}\n\
             - Samples recorded: {}\n\
             - Windows completed: {}\n\
             - Uploads: {} attempted, {} succeeded, {} failed, {} abandoned\n\
             - Uptime: {} seconds",
            stats.accel_events,
            stats.gyro_events,
            stats.samples_recorded,
            stats.windows_completed,
            stats.uploads_attempted,
            stats.uploads_succeeded,
            stats.uploads_failed,
            stats.uploads_abandoned,
            stats.uptime_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                accel_events: stats.accel_events,
                gyro_events: stats.gyro_events,
                samples_recorded: stats.samples_recorded,
                windows_completed: stats.windows_completed,
                uploads_attempted: stats.uploads_attempted,
                uploads_succeeded: stats.uploads_succeeded,
                uploads_failed: stats.uploads_failed,
                uploads_abandoned: stats.uploads_abandoned,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.accel_events
                    .store(persisted.accel_events, Ordering::Relaxed);
                self.gyro_events
                    .store(persisted.gyro_events, Ordering::Relaxed);
                self.samples_recorded
                    .store(persisted.samples_recorded, Ordering::Relaxed);
                self.windows_completed
                    .store(persisted.windows_completed, Ordering::Relaxed);
                self.uploads_attempted
                    .store(persisted.uploads_attempted, Ordering::Relaxed);
                self.uploads_succeeded
                    .store(persisted.uploads_succeeded, Ordering::Relaxed);
                self.uploads_failed
                    .store(persisted.uploads_failed, Ordering::Relaxed);
                self.uploads_abandoned
                    .store(persisted.uploads_abandoned, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for CollectionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of collection statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub accel_events: u64,
    pub gyro_events: u64,
    pub samples_recorded: u64,
    pub windows_completed: u64,
    pub uploads_attempted: u64,
    pub uploads_succeeded: u64,
    pub uploads_failed: u64,
    pub uploads_abandoned: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    accel_events: u64,
    gyro_events: u64,
    samples_recorded: u64,
    windows_completed: u64,
    uploads_attempted: u64,
    uploads_succeeded: u64,
    uploads_failed: u64,
    #[serde(default)]
    uploads_abandoned: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared collection log.
pub type SharedCollectionLog = Arc<CollectionLog>;

pub fn create_shared_log() -> SharedCollectionLog {
    Arc::new(CollectionLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedCollectionLog {
    Arc::new(CollectionLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_counting() {
        let log = CollectionLog::new();

        log.record_event(StreamKind::Accelerometer);
        log.record_event(StreamKind::Accelerometer);
        log.record_event(StreamKind::Gyroscope);
        log.record_sample();

        let stats = log.stats();
        assert_eq!(stats.accel_events, 2);
        assert_eq!(stats.gyro_events, 1);
        assert_eq!(stats.samples_recorded, 1);
    }

    #[test]
    fn test_upload_outcomes() {
        let log = CollectionLog::new();
        log.record_upload_attempt();
        log.record_upload_result(false);
        log.record_upload_attempt();
        log.record_upload_result(true);

        let stats = log.stats();
        assert_eq!(stats.uploads_attempted, 2);
        assert_eq!(stats.uploads_succeeded, 1);
        assert_eq!(stats.uploads_failed, 1);
    }

    #[test]
    fn test_abandoned_uploads_balance_attempts() {
        let log = CollectionLog::new();
        log.record_upload_attempt();
        log.record_upload_abandoned();
        log.record_upload_attempt();
        log.record_upload_result(true);

        let stats = log.stats();
        assert_eq!(
            stats.uploads_attempted,
            stats.uploads_succeeded + stats.uploads_failed + stats.uploads_abandoned
        );
        assert!(log.summary().contains("1 abandoned"));
    }

    #[test]
    fn test_persistence_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("motion-collector-stats-{}", uuid::Uuid::new_v4()))
            .join("stats.json");

        let log = CollectionLog::with_persistence(path.clone());
        log.record_window_completed();
        log.save().unwrap();

        let reloaded = CollectionLog::with_persistence(path.clone());
        assert_eq!(reloaded.stats().windows_completed, 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_summary_format() {
        let summary = CollectionLog::new().summary();
        assert!(summary.contains("Accelerometer events"));
        assert!(summary.contains("Windows completed"));
        assert!(summary.contains("Uploads"));
    }
}
