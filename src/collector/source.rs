//! The sensor collaborator contract.
//!
//! A [`SensorSource`] delivers asynchronous readings for each [`StreamKind`]
//! through a registered callback. Callbacks for the two streams may be invoked
//! concurrently from different threads.

use crate::collector::types::{SensorEvent, StreamKind};
use std::sync::Arc;

/// Callback invoked for every reading of a registered stream.
pub type EventCallback = Arc<dyn Fn(SensorEvent) + Send + Sync>;

/// A provider of accelerometer and gyroscope readings.
///
/// `register` and `unregister` may be called while the consumer holds the lock
/// its callbacks take, so neither may invoke a callback synchronously.
pub trait SensorSource: Send + Sync {
    /// Whether the given stream is present on this device right now.
    fn is_available(&self, kind: StreamKind) -> bool;

    /// Start delivering readings of `kind` to `callback`.
    ///
    /// Registering a stream that is already registered replaces its callback.
    fn register(&self, kind: StreamKind, callback: EventCallback) -> Result<(), CollectorError>;

    /// Stop delivering readings of `kind`.
    ///
    /// Must not wait for an in-progress callback to finish, since it may be
    /// called from inside that callback.
    fn unregister(&self, kind: StreamKind);
}

/// Errors that can occur while talking to a sensor source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorError {
    /// The stream is not present on this device
    Unavailable(StreamKind),
    /// The delivery thread could not be started
    SpawnFailed(String),
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::Unavailable(kind) => write!(f, "Sensor not available: {kind}"),
            CollectorError::SpawnFailed(e) => write!(f, "Failed to start sensor stream: {e}"),
        }
    }
}

impl std::error::Error for CollectorError {}
