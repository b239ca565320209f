//! Rate-limited sampling of the two motion streams.
//!
//! Raw events arrive at each sensor's native rate, far faster than the output
//! cadence. Any event from either stream may trigger a merge once the sampling
//! period has elapsed; the merge pairs the triggering reading with whatever the
//! other stream last reported.

use crate::collector::types::{SensorEvent, SensorSample};
use crate::core::cache::AxisCache;
use crate::core::windowing::SampleWindow;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Default output cadence (10 Hz).
pub const DEFAULT_SAMPLING_PERIOD: Duration = Duration::from_millis(100);

/// What a single event did to the active window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// No window is collecting; only the cache was updated
    Inactive,
    /// Less than one period since the last recorded sample
    Throttled,
    /// A sample was appended; `count` samples are now in the window
    Recorded { count: usize },
    /// A sample was appended and filled the window
    Completed { count: usize },
    /// The window was already full and refused the sample
    Full,
}

/// Merges the latest-value cache into samples at a bounded rate.
#[derive(Debug, Clone)]
pub struct RateLimitedSampler {
    period: chrono::Duration,
    cache: AxisCache,
    last_recorded: Option<DateTime<Utc>>,
}

impl RateLimitedSampler {
    pub fn new(period: Duration) -> Self {
        Self {
            period: chrono::Duration::from_std(period).unwrap_or(chrono::Duration::MAX),
            cache: AxisCache::new(),
            last_recorded: None,
        }
    }

    /// Handle one raw event.
    ///
    /// `window` is `Some` only while collection is active. Timestamps of
    /// recorded samples are non-decreasing: an event older than the last
    /// recorded sample never satisfies the period check.
    pub fn on_event(
        &mut self,
        event: &SensorEvent,
        window: Option<&mut SampleWindow>,
    ) -> SampleOutcome {
        self.cache.update(event.kind, event.values);

        let Some(window) = window else {
            return SampleOutcome::Inactive;
        };

        if let Some(last) = self.last_recorded {
            if event.timestamp - last < self.period {
                return SampleOutcome::Throttled;
            }
        }

        let (accel, gyro) = self.cache.snapshot();
        match window.push(SensorSample::new(event.timestamp, accel, gyro)) {
            Ok(completed) => {
                self.last_recorded = Some(event.timestamp);
                let count = window.len();
                if completed {
                    SampleOutcome::Completed { count }
                } else {
                    SampleOutcome::Recorded { count }
                }
            }
            Err(_) => SampleOutcome::Full,
        }
    }

    /// Current cache contents.
    pub fn cache(&self) -> &AxisCache {
        &self.cache
    }

    pub fn last_recorded(&self) -> Option<DateTime<Utc>> {
        self.last_recorded
    }

    pub fn period(&self) -> chrono::Duration {
        self.period
    }

    /// Forget the cache and the last recorded time.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.last_recorded = None;
    }
}

impl Default for RateLimitedSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLING_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::StreamKind;
    use chrono::Duration as ChronoDuration;

    fn event(kind: StreamKind, values: [f32; 3], base: DateTime<Utc>, ms: i64) -> SensorEvent {
        SensorEvent::new(kind, values, base + ChronoDuration::milliseconds(ms))
    }

    #[test]
    fn test_inactive_only_updates_cache() {
        let mut sampler = RateLimitedSampler::default();
        let base = Utc::now();

        let outcome = sampler.on_event(&event(StreamKind::Gyroscope, [1.0; 3], base, 0), None);
        assert_eq!(outcome, SampleOutcome::Inactive);
        assert_eq!(sampler.cache().gyro, [1.0; 3]);
        assert!(sampler.last_recorded().is_none());
    }

    #[test]
    fn test_first_event_records_then_throttles() {
        let mut sampler = RateLimitedSampler::default();
        let mut window = SampleWindow::new(10);
        let base = Utc::now();

        let first = event(StreamKind::Accelerometer, [1.0; 3], base, 0);
        assert_eq!(
            sampler.on_event(&first, Some(&mut window)),
            SampleOutcome::Recorded { count: 1 }
        );

        let early = event(StreamKind::Gyroscope, [2.0; 3], base, 99);
        assert_eq!(
            sampler.on_event(&early, Some(&mut window)),
            SampleOutcome::Throttled
        );

        let due = event(StreamKind::Accelerometer, [3.0; 3], base, 100);
        assert_eq!(
            sampler.on_event(&due, Some(&mut window)),
            SampleOutcome::Recorded { count: 2 }
        );

        // Throttled gyro reading still reached the cache and is merged here
        let merged = window.samples()[1];
        assert_eq!(merged.accel, [3.0; 3]);
        assert_eq!(merged.gyro, [2.0; 3]);
    }

    #[test]
    fn test_out_of_order_event_is_not_recorded() {
        let mut sampler = RateLimitedSampler::default();
        let mut window = SampleWindow::new(10);
        let base = Utc::now();

        sampler.on_event(
            &event(StreamKind::Accelerometer, [0.0; 3], base, 500),
            Some(&mut window),
        );
        let stale = event(StreamKind::Gyroscope, [0.0; 3], base, 0);
        assert_eq!(
            sampler.on_event(&stale, Some(&mut window)),
            SampleOutcome::Throttled
        );
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_completion_and_full_window() {
        let mut sampler = RateLimitedSampler::default();
        let mut window = SampleWindow::new(2);
        let base = Utc::now();

        sampler.on_event(
            &event(StreamKind::Accelerometer, [0.0; 3], base, 0),
            Some(&mut window),
        );
        assert_eq!(
            sampler.on_event(
                &event(StreamKind::Accelerometer, [0.0; 3], base, 100),
                Some(&mut window)
            ),
            SampleOutcome::Completed { count: 2 }
        );
        assert_eq!(
            sampler.on_event(
                &event(StreamKind::Accelerometer, [0.0; 3], base, 200),
                Some(&mut window)
            ),
            SampleOutcome::Full
        );
    }

    #[test]
    fn test_reset_clears_state() {
        let mut sampler = RateLimitedSampler::default();
        let mut window = SampleWindow::new(10);
        sampler.on_event(
            &event(StreamKind::Accelerometer, [5.0; 3], Utc::now(), 0),
            Some(&mut window),
        );

        sampler.reset();
        assert!(sampler.last_recorded().is_none());
        assert_eq!(*sampler.cache(), AxisCache::default());
    }
}
