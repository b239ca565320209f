//! Wire payload for the collision-data endpoint.
//!
//! The endpoint expects:
//!
//! ```json
//! {
//!   "situation": "...",
//!   "isCollision": true,
//!   "platform": "android",
//!   "data": [
//!     { "timestamp": "2025-06-30 17:00:00", "gyro": [0.0, 0.0, 0.0], "accel": [0.0, 0.0, 9.8] }
//!   ]
//! }
//! ```

use crate::collector::types::SensorSample;
use crate::core::windowing::SampleWindow;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Timestamp layout used on the wire (second resolution, no zone suffix).
pub const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Situation label sent when none is configured.
pub const DEFAULT_SITUATION: &str = "테스트 상황";

/// Platform tag the collection endpoint groups uploads by.
pub const DEFAULT_PLATFORM: &str = "android";

/// One serialized sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEntry {
    pub timestamp: String,
    pub gyro: [f32; 3],
    pub accel: [f32; 3],
}

/// Body of a collision-data submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub situation: String,
    #[serde(rename = "isCollision")]
    pub is_collision: bool,
    pub platform: String,
    /// One entry per sample, in window order
    #[serde(rename = "data")]
    pub samples: Vec<SensorEntry>,
}

/// Fixed parts of every request built by a session.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTemplate {
    pub situation: String,
    pub platform: String,
    /// Zone wire timestamps are rendered in
    pub timezone: Tz,
}

impl Default for RequestTemplate {
    fn default() -> Self {
        Self {
            situation: DEFAULT_SITUATION.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            timezone: Tz::UTC,
        }
    }
}

impl RequestTemplate {
    /// Build the request for `window` labelled with `is_collision`.
    ///
    /// Deterministic: the same window and flag always produce the same request.
    pub fn build(&self, window: &SampleWindow, is_collision: bool) -> UploadRequest {
        UploadRequest {
            situation: self.situation.clone(),
            is_collision,
            platform: self.platform.clone(),
            samples: window
                .samples()
                .iter()
                .map(|sample| self.entry(sample))
                .collect(),
        }
    }

    fn entry(&self, sample: &SensorSample) -> SensorEntry {
        SensorEntry {
            timestamp: sample
                .timestamp
                .with_timezone(&self.timezone)
                .format(WIRE_TIMESTAMP_FORMAT)
                .to_string(),
            gyro: sample.gyro,
            accel: sample.accel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window() -> SampleWindow {
        let mut window = SampleWindow::new(2);
        let t0 = Utc.with_ymd_and_hms(2025, 6, 30, 8, 0, 0).unwrap();
        window
            .push(SensorSample::new(t0, [0.0, 0.0, 9.8], [0.1, 0.2, 0.3]))
            .unwrap();
        window
            .push(SensorSample::new(
                t0 + chrono::Duration::milliseconds(1500),
                [1.0, 0.0, 9.8],
                [0.0, 0.0, 0.0],
            ))
            .unwrap();
        window
    }

    #[test]
    fn test_wire_shape() {
        let request = RequestTemplate::default().build(&window(), true);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["isCollision"], true);
        assert_eq!(json["platform"], "android");
        assert_eq!(json["situation"], DEFAULT_SITUATION);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["data"][0]["timestamp"], "2025-06-30 08:00:00");
        assert_eq!(json["data"][1]["timestamp"], "2025-06-30 08:00:01");
        assert!((json["data"][0]["gyro"][2].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert!(json.get("samples").is_none());
    }

    #[test]
    fn test_timestamps_follow_timezone() {
        let template = RequestTemplate {
            timezone: chrono_tz::Asia::Seoul,
            ..RequestTemplate::default()
        };
        let request = template.build(&window(), false);

        assert!(!request.is_collision);
        assert_eq!(request.samples[0].timestamp, "2025-06-30 17:00:00");
    }

    #[test]
    fn test_build_is_deterministic() {
        let template = RequestTemplate::default();
        let window = window();
        assert_eq!(template.build(&window, true), template.build(&window, true));
    }
}
