//! Event and sample types shared by sensor sources and the sampling core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Logical identity of one of the two physical motion sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Linear acceleration (m/s²)
    Accelerometer,
    /// Angular rate (rad/s)
    Gyroscope,
}

impl StreamKind {
    /// Both stream kinds, in registration order.
    pub const ALL: [StreamKind; 2] = [StreamKind::Accelerometer, StreamKind::Gyroscope];

    pub fn name(&self) -> &'static str {
        match self {
            StreamKind::Accelerometer => "accelerometer",
            StreamKind::Gyroscope => "gyroscope",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw reading delivered by a sensor stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    /// Which stream produced the reading
    pub kind: StreamKind,
    /// Three-axis values (x, y, z)
    pub values: [f32; 3],
    /// Time the reading was taken
    pub timestamp: DateTime<Utc>,
}

impl SensorEvent {
    pub fn new(kind: StreamKind, values: [f32; 3], timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            values,
            timestamp,
        }
    }

    /// Create an event stamped with the current wall-clock time.
    pub fn now(kind: StreamKind, values: [f32; 3]) -> Self {
        Self::new(kind, values, Utc::now())
    }
}

/// One merged, time-aligned reading of both streams.
///
/// Samples are immutable once recorded into a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Time of the event that triggered the merge
    pub timestamp: DateTime<Utc>,
    /// Latest accelerometer reading at merge time
    pub accel: [f32; 3],
    /// Latest gyroscope reading at merge time
    pub gyro: [f32; 3],
}

impl SensorSample {
    pub fn new(timestamp: DateTime<Utc>, accel: [f32; 3], gyro: [f32; 3]) -> Self {
        Self {
            timestamp,
            accel,
            gyro,
        }
    }

    /// Euclidean norm of the acceleration vector.
    pub fn accel_magnitude(&self) -> f64 {
        magnitude(&self.accel)
    }

    /// Euclidean norm of the angular-rate vector.
    pub fn gyro_magnitude(&self) -> f64 {
        magnitude(&self.gyro)
    }
}

fn magnitude(v: &[f32; 3]) -> f64 {
    v.iter()
        .map(|c| f64::from(*c) * f64::from(*c))
        .sum::<f64>()
        .sqrt()
}
