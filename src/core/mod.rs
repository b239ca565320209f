//! Core sampling engine.
//!
//! This module contains:
//! - The latest-value cache for the two motion streams
//! - Rate-limited sampling into fixed-capacity windows
//! - The collection lifecycle state machine
//! - Summary features of a collected window

pub mod cache;
pub mod features;
pub mod sampler;
pub mod state;
pub mod windowing;

// Re-export commonly used types
pub use cache::AxisCache;
pub use features::{compute_features, MagnitudeFeatures, WindowFeatures};
pub use sampler::{RateLimitedSampler, SampleOutcome, DEFAULT_SAMPLING_PERIOD};
pub use state::{CollectionPhase, CollectionStateMachine, StartPolicy};
pub use windowing::{SampleWindow, WINDOW_CAPACITY};
