//! Latest-value cache for the two motion streams.

use crate::collector::types::StreamKind;
use serde::{Deserialize, Serialize};

/// Most recent reading of each stream, zero until the stream first reports.
///
/// Writes from either stream may interleave in any order; the last write per
/// axis group wins. No staleness bound is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisCache {
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
}

impl AxisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot for `kind` with the latest reading.
    pub fn update(&mut self, kind: StreamKind, values: [f32; 3]) {
        match kind {
            StreamKind::Accelerometer => self.accel = values,
            StreamKind::Gyroscope => self.gyro = values,
        }
    }

    /// Current `(accel, gyro)` pair.
    pub fn snapshot(&self) -> ([f32; 3], [f32; 3]) {
        (self.accel, self.gyro)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_starts_zeroed() {
        let cache = AxisCache::new();
        assert_eq!(cache.snapshot(), ([0.0; 3], [0.0; 3]));
    }

    #[test]
    fn test_last_writer_wins_per_group() {
        let mut cache = AxisCache::new();
        cache.update(StreamKind::Accelerometer, [1.0, 2.0, 3.0]);
        cache.update(StreamKind::Gyroscope, [0.1, 0.2, 0.3]);
        cache.update(StreamKind::Accelerometer, [4.0, 5.0, 6.0]);

        let (accel, gyro) = cache.snapshot();
        assert_eq!(accel, [4.0, 5.0, 6.0]);
        assert_eq!(gyro, [0.1, 0.2, 0.3]);

        cache.clear();
        assert_eq!(cache, AxisCache::default());
    }
}
