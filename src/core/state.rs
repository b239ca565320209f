//! Collection lifecycle state machine.
//!
//! ```text
//!            start()              window full
//!   Idle ──────────────▶ Collecting ───────────▶ Ready
//!    ▲                       │                     │
//!    └───── stop()/reset() ──┴─────────────────────┘
//! ```
//!
//! Every `begin` and `clear` bumps a generation counter. Sensor callbacks are
//! tagged with the generation they were registered under, so a reading that
//! was already in flight when collection stopped is discarded.

use crate::collector::types::SensorEvent;
use crate::core::sampler::{RateLimitedSampler, SampleOutcome};
use crate::core::windowing::SampleWindow;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Phase of the collection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionPhase {
    /// Not sampling; the window is empty
    Idle,
    /// Sensor streams registered and samples being appended
    Collecting,
    /// Window full, waiting for classification and upload
    Ready,
}

impl std::fmt::Display for CollectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionPhase::Idle => write!(f, "idle"),
            CollectionPhase::Collecting => write!(f, "collecting"),
            CollectionPhase::Ready => write!(f, "ready"),
        }
    }
}

/// What `start()` does when a full window has not been uploaded yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    /// Drop the unsubmitted window and start over
    #[default]
    DiscardUnsubmitted,
    /// Refuse to start until the window is uploaded or explicitly reset
    KeepUnsubmitted,
}

/// Owns the active window and drives it through the collection phases.
#[derive(Debug)]
pub struct CollectionStateMachine {
    phase: CollectionPhase,
    capacity: usize,
    window: SampleWindow,
    sampler: RateLimitedSampler,
    generation: u64,
}

impl CollectionStateMachine {
    /// A `capacity` of zero is raised to one.
    pub fn new(capacity: usize, sampling_period: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            phase: CollectionPhase::Idle,
            capacity,
            window: SampleWindow::new(capacity),
            sampler: RateLimitedSampler::new(sampling_period),
            generation: 0,
        }
    }

    /// Enter `Collecting` with a fresh window.
    ///
    /// Returns the generation sensor callbacks must present to be accepted.
    pub fn begin(&mut self) -> u64 {
        self.clear();
        self.phase = CollectionPhase::Collecting;
        self.generation
    }

    /// Return to `Idle`, discarding the window and sampler state.
    pub fn clear(&mut self) {
        self.phase = CollectionPhase::Idle;
        self.window = SampleWindow::new(self.capacity);
        self.sampler.reset();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Feed one sensor event tagged with the generation it was delivered under.
    ///
    /// Moves to `Ready` on the event that fills the window; only that event
    /// ever reports [`SampleOutcome::Completed`].
    pub fn handle_event(&mut self, generation: u64, event: &SensorEvent) -> SampleOutcome {
        if generation != self.generation {
            return SampleOutcome::Inactive;
        }

        let window = match self.phase {
            CollectionPhase::Collecting => Some(&mut self.window),
            _ => None,
        };
        let outcome = self.sampler.on_event(event, window);

        if let SampleOutcome::Completed { .. } = outcome {
            self.phase = CollectionPhase::Ready;
        }
        outcome
    }

    pub fn phase(&self) -> CollectionPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::StreamKind;
    use chrono::{Duration as ChronoDuration, Utc};

    fn machine(capacity: usize) -> CollectionStateMachine {
        CollectionStateMachine::new(capacity, Duration::from_millis(100))
    }

    #[test]
    fn test_idle_ignores_events() {
        let mut sm = machine(3);
        let generation = sm.generation();
        let event = SensorEvent::now(StreamKind::Accelerometer, [1.0; 3]);

        assert_eq!(sm.handle_event(generation, &event), SampleOutcome::Inactive);
        assert_eq!(sm.phase(), CollectionPhase::Idle);
        assert_eq!(sm.sample_count(), 0);
    }

    #[test]
    fn test_fills_to_ready() {
        let mut sm = machine(3);
        let generation = sm.begin();
        let base = Utc::now();

        for i in 0..10 {
            let event = SensorEvent::new(
                StreamKind::Accelerometer,
                [i as f32; 3],
                base + ChronoDuration::milliseconds(i * 100),
            );
            sm.handle_event(generation, &event);
        }

        assert_eq!(sm.phase(), CollectionPhase::Ready);
        assert_eq!(sm.sample_count(), 3);
        assert!(sm.window().is_complete());
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let mut sm = machine(3);
        let old = sm.begin();
        let current = sm.begin();
        assert_ne!(old, current);

        let event = SensorEvent::now(StreamKind::Gyroscope, [1.0; 3]);
        assert_eq!(sm.handle_event(old, &event), SampleOutcome::Inactive);
        assert_eq!(
            sm.handle_event(current, &event),
            SampleOutcome::Recorded { count: 1 }
        );
    }

    #[test]
    fn test_clear_discards_window() {
        let mut sm = machine(3);
        let generation = sm.begin();
        sm.handle_event(
            generation,
            &SensorEvent::now(StreamKind::Accelerometer, [1.0; 3]),
        );
        let old_window = sm.window().id();

        sm.clear();
        assert_eq!(sm.phase(), CollectionPhase::Idle);
        assert_eq!(sm.sample_count(), 0);
        assert_ne!(sm.window().id(), old_window);
    }
}
