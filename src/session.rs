//! Collection session controller.
//!
//! A [`CollectionSession`] owns one collect → classify → upload cycle. It
//! registers with an injected [`SensorSource`], feeds events through the
//! collection state machine under a single lock, and guards submission of the
//! finished window through a [`Transport`].
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
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let sensor = Arc::new(SimulatedSensor::new(SimulatedSensorConfig::default()));
//! let transport = HttpTransport::new(std::time::Duration::from_secs(10))?;
//! let session = CollectionSession::new(sensor, transport, SessionSettings::default());
//!
//! session.start()?;
//! // ... wait for the window to fill ...
//! let response = session.submit(true).await?;
//! println!("{}", response.body);
//! # Ok(())
//! # }
//! ```

use crate::collector::source::{CollectorError, EventCallback, SensorSource};
use crate::collector::types::{SensorEvent, StreamKind};
use crate::core::sampler::{SampleOutcome, DEFAULT_SAMPLING_PERIOD};
use crate::core::state::{CollectionPhase, CollectionStateMachine, StartPolicy};
use crate::core::windowing::{SampleWindow, WINDOW_CAPACITY};
use crate::telemetry::{create_shared_log, SharedCollectionLog};
use crate::upload::guard::{UploadError, UploadGuard, UploadStatus};
use crate::upload::request::{RequestTemplate, UploadRequest};
use crate::upload::transport::{Transport, TransportResponse, DEFAULT_ENDPOINT};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use uuid::Uuid;

/// Capacity of each subscriber's notification queue.
const NOTIFICATION_QUEUE: usize = 1_024;

/// Settings a session is built with.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Samples per window
    pub capacity: usize,
    /// Minimum spacing between recorded samples
    pub sampling_period: Duration,
    pub start_policy: StartPolicy,
    /// Collision-data endpoint
    pub endpoint: String,
    pub template: RequestTemplate,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            capacity: WINDOW_CAPACITY,
            sampling_period: DEFAULT_SAMPLING_PERIOD,
            start_policy: StartPolicy::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            template: RequestTemplate::default(),
        }
    }
}

/// Session error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A required sensor stream is missing
    SensorUnavailable(StreamKind),
    /// A full window has not been uploaded and the start policy keeps it
    UnsubmittedWindow,
    /// The sensor source failed to start a stream
    Collector(CollectorError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::SensorUnavailable(kind) => write!(f, "Sensor not available: {kind}"),
            SessionError::UnsubmittedWindow => {
                write!(f, "A completed window has not been uploaded; reset first")
            }
            SessionError::Collector(e) => write!(f, "Collector error: {e}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<CollectorError> for SessionError {
    fn from(e: CollectorError) -> Self {
        match e {
            CollectorError::Unavailable(kind) => SessionError::SensorUnavailable(kind),
            other => SessionError::Collector(other),
        }
    }
}

/// State change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged(CollectionPhase),
    SampleRecorded { count: usize },
    WindowReady { window_id: Uuid },
    Uploaded { window_id: Uuid },
    UploadFailed { message: String },
}

/// Point-in-time view of a session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: CollectionPhase,
    pub sample_count: usize,
    pub capacity: usize,
    pub upload_status: UploadStatus,
    pub window_id: Uuid,
}

impl SessionSnapshot {
    pub fn is_uploaded(&self) -> bool {
        self.upload_status == UploadStatus::Uploaded
    }
}

struct SessionState {
    machine: CollectionStateMachine,
    guard: UploadGuard,
}

struct SessionInner<T> {
    sensor: Arc<dyn SensorSource>,
    transport: T,
    endpoint: String,
    start_policy: StartPolicy,
    state: Mutex<SessionState>,
    subscribers: Mutex<Vec<Sender<SessionEvent>>>,
    log: SharedCollectionLog,
}

/// One collect → classify → upload cycle.
///
/// Cloning yields another handle to the same session.
pub struct CollectionSession<T: Transport> {
    inner: Arc<SessionInner<T>>,
}

impl<T: Transport> Clone for CollectionSession<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> CollectionSession<T> {
    pub fn new(sensor: Arc<dyn SensorSource>, transport: T, settings: SessionSettings) -> Self {
        Self::with_log(sensor, transport, settings, create_shared_log())
    }

    /// Create a session that reports into an existing statistics log.
    pub fn with_log(
        sensor: Arc<dyn SensorSource>,
        transport: T,
        settings: SessionSettings,
        log: SharedCollectionLog,
    ) -> Self {
        let state = SessionState {
            machine: CollectionStateMachine::new(settings.capacity, settings.sampling_period),
            guard: UploadGuard::new(settings.template),
        };

        Self {
            inner: Arc::new(SessionInner {
                sensor,
                transport,
                endpoint: settings.endpoint,
                start_policy: settings.start_policy,
                state: Mutex::new(state),
                subscribers: Mutex::new(Vec::new()),
                log,
            }),
        }
    }

    /// Begin collecting a fresh window.
    ///
    /// Any collection in progress is stopped and discarded first. Fails with
    /// [`SessionError::SensorUnavailable`] and stays `Idle` if either stream is
    /// missing.
    pub fn start(&self) -> Result<(), SessionError> {
        let (previous, started) = {
            let mut state = self.inner.lock_state();
            if self.inner.start_policy == StartPolicy::KeepUnsubmitted
                && state.machine.phase() == CollectionPhase::Ready
                && !state.guard.is_uploaded()
            {
                tracing::warn!("Refusing to start over an unsubmitted window");
                return Err(SessionError::UnsubmittedWindow);
            }

            let previous = self.inner.detach(&mut state);
            (previous, self.attach(&mut state))
        };

        if previous != CollectionPhase::Idle {
            tracing::info!(from = %previous, "Collection stopped");
            self.inner.notify(SessionEvent::PhaseChanged(CollectionPhase::Idle));
        }

        let generation = started?;
        tracing::info!(generation, "Collection started");
        self.inner.notify(SessionEvent::PhaseChanged(CollectionPhase::Collecting));
        Ok(())
    }

    /// Begin a window and register both streams under the held state lock.
    ///
    /// On failure the session is left `Idle` with no stream registered.
    fn attach(&self, state: &mut SessionState) -> Result<u64, SessionError> {
        for kind in StreamKind::ALL {
            if !self.inner.sensor.is_available(kind) {
                tracing::warn!(stream = %kind, "Sensor not available, collection not started");
                return Err(SessionError::SensorUnavailable(kind));
            }
        }

        let generation = state.machine.begin();

        for kind in StreamKind::ALL {
            let weak = Arc::downgrade(&self.inner);
            if let Err(e) = self
                .inner
                .sensor
                .register(kind, event_callback(weak, generation))
            {
                tracing::warn!(stream = %kind, "Failed to register sensor stream: {e}");
                self.inner.detach(state);
                return Err(e.into());
            }
        }

        Ok(generation)
    }

    /// Stop sampling and discard the window.
    ///
    /// Both streams are unregistered before this returns; a reading already
    /// in flight is dropped.
    pub fn stop(&self) {
        self.inner.halt();
    }

    /// Return to the initial state: no window, no upload outcome.
    pub fn reset(&self) {
        self.inner.halt();
    }

    /// Submit the completed window labelled with `is_collision`.
    ///
    /// The transport is called at most once per call and never after a
    /// successful submission of the same window. The session lock is not held
    /// while the request is in flight. Dropping the returned future before the
    /// transport answers releases the window for another attempt.
    pub async fn submit(&self, is_collision: bool) -> Result<TransportResponse, UploadError> {
        let ticket = {
            let mut guard = self.inner.lock_state();
            let state = &mut *guard;
            state
                .guard
                .begin(state.machine.phase(), state.machine.window(), is_collision)
        };
        let ticket = match ticket {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::debug!("Upload rejected: {e}");
                return Err(e);
            }
        };

        self.inner.log.record_upload_attempt();
        tracing::info!(
            window_id = %ticket.window_id,
            samples = ticket.request.samples.len(),
            is_collision,
            "Uploading window"
        );

        let mut pending = PendingUpload {
            inner: &*self.inner,
            window_id: ticket.window_id,
            settled: false,
        };
        let result = self
            .inner
            .transport
            .put(&self.inner.endpoint, &ticket.request)
            .await;
        pending.settled = true;

        {
            let mut state = self.inner.lock_state();
            if state.machine.window().id() != ticket.window_id {
                drop(state);
                self.inner.log.record_upload_abandoned();
                tracing::warn!(
                    window_id = %ticket.window_id,
                    "Ignoring upload completion for a window that was reset"
                );
                return Err(UploadError::Stale);
            }
            state.guard.finish(result.is_ok());
        }

        self.inner.log.record_upload_result(result.is_ok());
        match result {
            Ok(response) => {
                tracing::info!(status = response.status, "Window uploaded");
                self.inner.notify(SessionEvent::Uploaded {
                    window_id: ticket.window_id,
                });
                Ok(response)
            }
            Err(e) => {
                tracing::error!("Upload failed: {e}");
                self.inner.notify(SessionEvent::UploadFailed {
                    message: e.to_string(),
                });
                Err(UploadError::TransportFailure(e))
            }
        }
    }

    /// Submit on the current Tokio runtime and report through `on_result`.
    ///
    /// `on_result` receives `(success, message)`, where the message is the
    /// response body or the error text. Completions for a window that was
    /// reset meanwhile are swallowed and `on_result` is not called.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_submit<F>(&self, is_collision: bool, on_result: F) -> tokio::task::JoinHandle<()>
    where
        F: FnOnce(bool, String) + Send + 'static,
    {
        let session = self.clone();
        tokio::spawn(async move {
            match session.submit(is_collision).await {
                Ok(response) => on_result(true, response.body),
                Err(UploadError::Stale) => {}
                Err(e) => on_result(false, e.to_string()),
            }
        })
    }

    /// Build the request `submit` would send, without sending it.
    pub fn preview_request(&self, is_collision: bool) -> Result<UploadRequest, UploadError> {
        let state = self.inner.lock_state();
        state
            .guard
            .preview(state.machine.phase(), state.machine.window(), is_collision)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock_state();
        SessionSnapshot {
            phase: state.machine.phase(),
            sample_count: state.machine.sample_count(),
            capacity: state.machine.capacity(),
            upload_status: state.guard.status(),
            window_id: state.machine.window().id(),
        }
    }

    pub fn phase(&self) -> CollectionPhase {
        self.inner.lock_state().machine.phase()
    }

    pub fn sample_count(&self) -> usize {
        self.inner.lock_state().machine.sample_count()
    }

    pub fn is_uploaded(&self) -> bool {
        self.inner.lock_state().guard.is_uploaded()
    }

    /// Copy of the current window.
    pub fn window(&self) -> SampleWindow {
        self.inner.lock_state().machine.window().clone()
    }

    /// Receive state change notifications from now on.
    ///
    /// Notifications are dropped for a subscriber whose queue is full.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (sender, receiver) = bounded(NOTIFICATION_QUEUE);
        self.inner.lock_subscribers().push(sender);
        receiver
    }

    pub fn log(&self) -> &SharedCollectionLog {
        &self.inner.log
    }
}

/// Releases the in-flight claim if a `submit` future is dropped before the
/// transport answers, so the window stays retryable.
struct PendingUpload<'a, T: Transport> {
    inner: &'a SessionInner<T>,
    window_id: Uuid,
    settled: bool,
}

impl<T: Transport> Drop for PendingUpload<'_, T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        {
            let mut state = self.inner.lock_state();
            if state.machine.window().id() == self.window_id {
                state.guard.finish(false);
            }
        }
        self.inner.log.record_upload_abandoned();
        tracing::warn!(window_id = %self.window_id, "Upload cancelled before completion");
    }
}

fn event_callback<T: Transport>(weak: Weak<SessionInner<T>>, generation: u64) -> EventCallback {
    Arc::new(move |event: SensorEvent| {
        if let Some(inner) = weak.upgrade() {
            inner.on_event(generation, event);
        }
    })
}

impl<T: Transport> SessionInner<T> {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<Sender<SessionEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sensor delivery path: O(1), never blocks on I/O.
    fn on_event(&self, generation: u64, event: SensorEvent) {
        let (outcome, window_id) = {
            let mut state = self.lock_state();
            let outcome = state.machine.handle_event(generation, &event);
            if let SampleOutcome::Completed { .. } = outcome {
                // Still under the lock, so a concurrent start cannot have
                // registered streams of a newer generation yet
                self.unregister_all();
            }
            (outcome, state.machine.window().id())
        };

        self.log.record_event(event.kind);

        match outcome {
            SampleOutcome::Recorded { count } => {
                self.log.record_sample();
                tracing::debug!(count, "Sample recorded");
                self.notify(SessionEvent::SampleRecorded { count });
            }
            SampleOutcome::Completed { count } => {
                self.log.record_sample();
                self.log.record_window_completed();
                tracing::info!(%window_id, count, "Window complete");
                self.notify(SessionEvent::SampleRecorded { count });
                self.notify(SessionEvent::PhaseChanged(CollectionPhase::Ready));
                self.notify(SessionEvent::WindowReady { window_id });
            }
            SampleOutcome::Inactive | SampleOutcome::Throttled | SampleOutcome::Full => {}
        }
    }

    /// Move to `Idle` and detach from both streams.
    fn halt(&self) {
        let previous = {
            let mut state = self.lock_state();
            self.detach(&mut state)
        };

        if previous != CollectionPhase::Idle {
            tracing::info!(from = %previous, "Collection stopped");
            self.notify(SessionEvent::PhaseChanged(CollectionPhase::Idle));
        }
    }

    /// Clear the window and upload outcome and unregister both streams.
    ///
    /// Called with the state lock held, so registration changes are ordered
    /// with generation changes. Returns the phase before clearing.
    fn detach(&self, state: &mut SessionState) -> CollectionPhase {
        let previous = state.machine.phase();
        state.machine.clear();
        state.guard.reset();
        self.unregister_all();
        previous
    }

    fn unregister_all(&self) {
        for kind in StreamKind::ALL {
            self.sensor.unregister(kind);
        }
    }

    fn notify(&self, event: SessionEvent) {
        self.lock_subscribers()
            .retain(|sender| match sender.try_send(event.clone()) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            });
    }
}
