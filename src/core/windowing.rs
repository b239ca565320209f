//! Fixed-capacity sample windows.
//!
//! A window fills in collection order and is complete once it holds exactly
//! `capacity` samples. Each window carries a unique id so work started against
//! one window can be told apart from work against its replacement.

use crate::collector::types::SensorSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of samples in a complete window.
pub const WINDOW_CAPACITY: usize = 100;

/// An ordered, capacity-bounded run of samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleWindow {
    id: Uuid,
    capacity: usize,
    samples: Vec<SensorSample>,
}

impl SampleWindow {
    /// Create a new empty window.
    pub fn new(capacity: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            capacity,
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a sample.
    ///
    /// Returns `Ok(true)` when this append filled the window, and hands the
    /// sample back if the window was already full.
    pub fn push(&mut self, sample: SensorSample) -> Result<bool, SensorSample> {
        if self.is_complete() {
            return Err(sample);
        }
        self.samples.push(sample);
        Ok(self.is_complete())
    }

    pub fn samples(&self) -> &[SensorSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    /// Timestamp of the first sample.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.timestamp)
    }

    /// Timestamp of the most recent sample.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.timestamp)
    }

    /// Time spanned from first to last sample, in seconds.
    pub fn duration_secs(&self) -> f64 {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_at(base: DateTime<Utc>, offset_ms: i64) -> SensorSample {
        SensorSample::new(base + Duration::milliseconds(offset_ms), [0.0; 3], [0.0; 3])
    }

    #[test]
    fn test_window_creation() {
        let window = SampleWindow::new(WINDOW_CAPACITY);
        assert!(window.is_empty());
        assert!(!window.is_complete());
        assert_eq!(window.capacity(), 100);
        assert_eq!(window.duration_secs(), 0.0);
    }

    #[test]
    fn test_window_ids_are_unique() {
        assert_ne!(SampleWindow::new(1).id(), SampleWindow::new(1).id());
    }

    #[test]
    fn test_push_reports_completion_and_rejects_overflow() {
        let base = Utc::now();
        let mut window = SampleWindow::new(3);

        assert_eq!(window.push(sample_at(base, 0)), Ok(false));
        assert_eq!(window.push(sample_at(base, 100)), Ok(false));
        assert_eq!(window.push(sample_at(base, 200)), Ok(true));
        assert!(window.is_complete());

        let extra = sample_at(base, 300);
        assert_eq!(window.push(extra), Err(extra));
        assert_eq!(window.len(), 3);
        assert!((window.duration_secs() - 0.2).abs() < 1e-9);
    }
}
