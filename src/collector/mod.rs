//! Sensor collection module.
//!
//! This module defines the sensor collaborator contract and its two
//! implementations: a threaded simulation and a deterministic scripted source.

pub mod scripted;
pub mod simulated;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use scripted::ScriptedSensor;
pub use simulated::{SimulatedSensor, SimulatedSensorConfig};
pub use source::{CollectorError, EventCallback, SensorSource};
pub use types::{SensorEvent, SensorSample, StreamKind};
