//! Simulated motion sensor driven by background threads.
//!
//! Each registered stream gets its own delivery thread emitting readings at a
//! fixed native interval, so the two streams are independently clocked the same
//! way real accelerometer and gyroscope hardware is.

use crate::collector::source::{CollectorError, EventCallback, SensorSource};
use crate::collector::types::{SensorEvent, StreamKind};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const STANDARD_GRAVITY: f32 = 9.806_65;

/// Configuration for the simulated streams.
#[derive(Debug, Clone)]
pub struct SimulatedSensorConfig {
    /// Delivery interval of the accelerometer stream
    pub accel_interval: Duration,
    /// Delivery interval of the gyroscope stream
    pub gyro_interval: Duration,
    pub accel_available: bool,
    pub gyro_available: bool,
}

impl Default for SimulatedSensorConfig {
    fn default() -> Self {
        Self {
            accel_interval: Duration::from_millis(20),
            gyro_interval: Duration::from_millis(17),
            accel_available: true,
            gyro_available: true,
        }
    }
}

impl SimulatedSensorConfig {
    /// Build a configuration from native rates in Hz.
    pub fn from_rates(accel_hz: f64, gyro_hz: f64) -> Self {
        Self {
            accel_interval: Duration::from_secs_f64(1.0 / accel_hz.max(1.0)),
            gyro_interval: Duration::from_secs_f64(1.0 / gyro_hz.max(1.0)),
            ..Self::default()
        }
    }

    fn interval(&self, kind: StreamKind) -> Duration {
        match kind {
            StreamKind::Accelerometer => self.accel_interval,
            StreamKind::Gyroscope => self.gyro_interval,
        }
    }

    fn available(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Accelerometer => self.accel_available,
            StreamKind::Gyroscope => self.gyro_available,
        }
    }
}

/// A sensor source that synthesizes a device gently swaying at rest.
pub struct SimulatedSensor {
    config: SimulatedSensorConfig,
    /// Running flag of each registered stream's delivery thread
    streams: Mutex<HashMap<StreamKind, Arc<AtomicBool>>>,
}

impl SimulatedSensor {
    pub fn new(config: SimulatedSensorConfig) -> Self {
        Self {
            config,
            streams: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether a stream currently has a live delivery thread.
    pub fn is_streaming(&self, kind: StreamKind) -> bool {
        self.streams
            .lock()
            .map(|streams| {
                streams
                    .get(&kind)
                    .map(|running| running.load(Ordering::SeqCst))
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    fn synthesize(kind: StreamKind, tick: u64) -> [f32; 3] {
        let phase = tick as f32 * 0.05;
        match kind {
            StreamKind::Accelerometer => [
                0.15 * phase.sin(),
                0.10 * phase.cos(),
                STANDARD_GRAVITY + 0.05 * (2.0 * phase).sin(),
            ],
            StreamKind::Gyroscope => [
                0.02 * phase.cos(),
                0.03 * phase.sin(),
                0.01 * (3.0 * phase).sin(),
            ],
        }
    }
}

impl SensorSource for SimulatedSensor {
    fn is_available(&self, kind: StreamKind) -> bool {
        self.config.available(kind)
    }

    fn register(&self, kind: StreamKind, callback: EventCallback) -> Result<(), CollectorError> {
        if !self.is_available(kind) {
            return Err(CollectorError::Unavailable(kind));
        }

        let running = Arc::new(AtomicBool::new(true));
        {
            let mut streams = self
                .streams
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(previous) = streams.insert(kind, running.clone()) {
                previous.store(false, Ordering::SeqCst);
            }
        }

        let interval = self.config.interval(kind);
        let flag = running.clone();
        let spawned = thread::Builder::new()
            .name(format!("sim-{kind}"))
            .spawn(move || {
                let mut tick = 0u64;
                while flag.load(Ordering::SeqCst) {
                    callback(SensorEvent::now(kind, Self::synthesize(kind, tick)));
                    tick += 1;
                    thread::sleep(interval);
                }
                tracing::debug!(stream = %kind, ticks = tick, "Simulated stream stopped");
            });

        if let Err(e) = spawned {
            running.store(false, Ordering::SeqCst);
            return Err(CollectorError::SpawnFailed(e.to_string()));
        }

        tracing::debug!(stream = %kind, ?interval, "Simulated stream registered");
        Ok(())
    }

    fn unregister(&self, kind: StreamKind) {
        let mut streams = self
            .streams
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(running) = streams.remove(&kind) {
            // The thread exits on its next tick; it is never joined here
            running.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for SimulatedSensor {
    fn drop(&mut self) {
        for kind in StreamKind::ALL {
            self.unregister(kind);
        }
    }
}
