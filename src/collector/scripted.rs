//! Deterministic sensor source for tests and offline replay.
//!
//! Nothing runs in the background: readings reach the registered callback only
//! when the caller invokes [`ScriptedSensor::emit`], on the caller's thread.

use crate::collector::source::{CollectorError, EventCallback, SensorSource};
use crate::collector::types::{SensorEvent, StreamKind};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct ScriptedSensor {
    accel_available: AtomicBool,
    gyro_available: AtomicBool,
    callbacks: Mutex<HashMap<StreamKind, EventCallback>>,
    registrations: AtomicUsize,
}

impl ScriptedSensor {
    /// Create a source with both streams available.
    pub fn new() -> Self {
        Self {
            accel_available: AtomicBool::new(true),
            gyro_available: AtomicBool::new(true),
            callbacks: Mutex::new(HashMap::new()),
            registrations: AtomicUsize::new(0),
        }
    }

    /// Mark a stream as present or absent.
    pub fn set_available(&self, kind: StreamKind, available: bool) {
        self.flag(kind).store(available, Ordering::SeqCst);
    }

    /// Deliver one reading to the stream's callback.
    ///
    /// Returns `false` when the stream has no registered callback.
    pub fn emit(&self, kind: StreamKind, values: [f32; 3], timestamp: DateTime<Utc>) -> bool {
        let callback = self.lock().get(&kind).cloned();
        match callback {
            Some(callback) => {
                callback(SensorEvent::new(kind, values, timestamp));
                true
            }
            None => false,
        }
    }

    /// Whether a callback is currently registered for the stream.
    pub fn is_registered(&self, kind: StreamKind) -> bool {
        self.lock().contains_key(&kind)
    }

    /// Total number of successful `register` calls so far.
    pub fn registration_count(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    fn flag(&self, kind: StreamKind) -> &AtomicBool {
        match kind {
            StreamKind::Accelerometer => &self.accel_available,
            StreamKind::Gyroscope => &self.gyro_available,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<StreamKind, EventCallback>> {
        self.callbacks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ScriptedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for ScriptedSensor {
    fn is_available(&self, kind: StreamKind) -> bool {
        self.flag(kind).load(Ordering::SeqCst)
    }

    fn register(&self, kind: StreamKind, callback: EventCallback) -> Result<(), CollectorError> {
        if !self.is_available(kind) {
            return Err(CollectorError::Unavailable(kind));
        }
        self.lock().insert(kind, callback);
        self.registrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unregister(&self, kind: StreamKind) {
        self.lock().remove(&kind);
    }
}
