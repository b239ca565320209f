//! Summary features of a collected window.
//!
//! Shown to the operator before a window is classified, so an obviously idle
//! recording can be told apart from one that contains an impact.

use crate::collector::types::SensorSample;
use crate::core::windowing::SampleWindow;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Standard gravity in m/s².
const GRAVITY: f64 = 9.806_65;

/// Deviation from gravity (m/s²) counted as an acceleration spike.
const ACCELERATION_SPIKE_THRESHOLD: f64 = 4.9;

/// Magnitude statistics of one stream across a window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MagnitudeFeatures {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub peak: f64,
}

/// All computed features for a window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowFeatures {
    pub sample_count: usize,
    /// Seconds between first and last sample
    pub duration_secs: f64,
    /// Samples per second actually achieved
    pub effective_rate_hz: f64,
    /// Acceleration magnitude (m/s²)
    pub accel: MagnitudeFeatures,
    /// Angular-rate magnitude (rad/s)
    pub gyro: MagnitudeFeatures,
    /// Samples whose acceleration departs sharply from gravity
    pub acceleration_spikes: u32,
}

/// Compute all features from a sample window.
pub fn compute_features(window: &SampleWindow) -> WindowFeatures {
    let samples = window.samples();
    let accel: Vec<f64> = samples.iter().map(SensorSample::accel_magnitude).collect();
    let gyro: Vec<f64> = samples.iter().map(SensorSample::gyro_magnitude).collect();

    let duration_secs = window.duration_secs();
    // n samples span n - 1 periods
    let effective_rate_hz = if duration_secs > 0.0 {
        (samples.len().saturating_sub(1)) as f64 / duration_secs
    } else {
        0.0
    };

    let acceleration_spikes = accel
        .iter()
        .filter(|m| (*m - GRAVITY).abs() > ACCELERATION_SPIKE_THRESHOLD)
        .count() as u32;

    WindowFeatures {
        sample_count: samples.len(),
        duration_secs,
        effective_rate_hz,
        accel: magnitude_features(&accel),
        gyro: magnitude_features(&gyro),
        acceleration_spikes,
    }
}

fn magnitude_features(values: &[f64]) -> MagnitudeFeatures {
    if values.is_empty() {
        return MagnitudeFeatures::default();
    }

    let std_dev = if values.len() < 2 {
        0.0
    } else {
        values.iter().population_std_dev()
    };

    MagnitudeFeatures {
        mean: values.iter().mean(),
        std_dev,
        peak: values.iter().copied().fold(f64::MIN, f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn window_with(accels: &[[f32; 3]]) -> SampleWindow {
        let base = Utc::now();
        let mut window = SampleWindow::new(accels.len());
        for (i, accel) in accels.iter().enumerate() {
            let sample = SensorSample::new(
                base + Duration::milliseconds(i as i64 * 100),
                *accel,
                [0.0, 0.0, 1.0],
            );
            window.push(sample).unwrap();
        }
        window
    }

    #[test]
    fn test_features_empty() {
        let features = compute_features(&SampleWindow::new(10));
        assert_eq!(features.sample_count, 0);
        assert_eq!(features.effective_rate_hz, 0.0);
        assert_eq!(features.accel.peak, 0.0);
    }

    #[test]
    fn test_resting_window() {
        let window = window_with(&[[0.0, 0.0, 9.8]; 11]);
        let features = compute_features(&window);

        assert_eq!(features.sample_count, 11);
        assert!((features.duration_secs - 1.0).abs() < 1e-9);
        assert!((features.effective_rate_hz - 10.0).abs() < 1e-9);
        assert!((features.accel.mean - 9.8).abs() < 1e-4);
        assert!(features.accel.std_dev < 1e-6);
        assert!((features.gyro.peak - 1.0).abs() < 1e-9);
        assert_eq!(features.acceleration_spikes, 0);
    }

    #[test]
    fn test_impact_counts_as_spike() {
        let window = window_with(&[[0.0, 0.0, 9.8], [30.0, 0.0, 9.8], [0.0, 0.0, 9.8]]);
        let features = compute_features(&window);

        assert_eq!(features.acceleration_spikes, 1);
        assert!(features.accel.peak > 30.0);
        assert!(features.accel.std_dev > 0.0);
    }
}
