//! Motion Window Collector - fixed-window accelerometer/gyroscope capture with
//! idempotent upload of labelled collision data.
//!
//! The collector merges two independently clocked sensor streams into
//! time-aligned samples at a fixed cadence, stops once a window is full, and
//! submits that window to the collision-data endpoint at most once.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      Motion Window Collector                     │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐             │
//! │  │   Sensor    │──▶│   Sampler   │──▶│   Window    │             │
//! │  │ accel/gyro  │   │  (100 ms)   │   │ (100 slots) │             │
//! │  └─────────────┘   └─────────────┘   └─────────────┘             │
//! │                                             │ full               │
//! │                                             ▼                    │
//! │  ┌─────────────┐                     ┌─────────────┐             │
//! │  │ Collection  │                     │   Upload    │──▶ PUT      │
//! │  │    Log      │                     │   Guard     │             │
//! │  └─────────────┘                     └─────────────┘             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use motion_window_collector::{
//!     collector::{SimulatedSensor, SimulatedSensorConfig},
//!     session::{CollectionSession, SessionSettings},
//!     upload::HttpTransport,
//! };
//!
//! let sensor = Arc::new(SimulatedSensor::new(SimulatedSensorConfig::default()));
//! let transport = HttpTransport::new(std::time::Duration::from_secs(10)).unwrap();
//! let session = CollectionSession::new(sensor, transport, SessionSettings::default());
//!
//! // Both streams must be present or this fails with SensorUnavailable
//! session.start().expect("Failed to start collection");
//!
//! // State changes can be received from session.subscribe()
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod session;
pub mod telemetry;
pub mod upload;

// Re-export key types at crate root for convenience
pub use collector::{
    CollectorError, ScriptedSensor, SensorEvent, SensorSample, SensorSource, SimulatedSensor,
    SimulatedSensorConfig, StreamKind,
};
pub use config::{Config, ConfigError};
pub use core::{
    compute_features, CollectionPhase, SampleWindow, StartPolicy, WindowFeatures, WINDOW_CAPACITY,
};
pub use session::{CollectionSession, SessionError, SessionEvent, SessionSettings, SessionSnapshot};
pub use telemetry::{CollectionLog, CollectionStats, SharedCollectionLog};
pub use upload::{
    Transport, TransportError, TransportResponse, UploadError, UploadRequest, UploadStatus,
};

#[cfg(feature = "http")]
pub use upload::HttpTransport;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
