//! At-most-once submission of a completed window.
//!
//! The guard hands out an [`UploadTicket`] only for a `Ready` window that has
//! neither been uploaded nor has a submission in flight, and it records the
//! outcome once the transport answers.

use crate::core::state::CollectionPhase;
use crate::core::windowing::SampleWindow;
use crate::upload::request::{RequestTemplate, UploadRequest};
use crate::upload::transport::TransportError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Submission status of the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    #[default]
    NotUploaded,
    InFlight,
    Uploaded,
}

/// Upload error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The window is not complete yet
    NotReady,
    /// This window was already submitted successfully
    AlreadyUploaded,
    /// Another submission of this window has not finished
    InProgress,
    /// The session was reset while the submission was in flight
    Stale,
    /// Network, server, or serialization failure; the window stays retryable
    TransportFailure(TransportError),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::NotReady => write!(f, "Window is not complete"),
            UploadError::AlreadyUploaded => write!(f, "Window was already uploaded"),
            UploadError::InProgress => write!(f, "Upload already in progress"),
            UploadError::Stale => write!(f, "Session was reset during upload"),
            UploadError::TransportFailure(e) => write!(f, "Upload failed: {e}"),
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UploadError::TransportFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for UploadError {
    fn from(e: TransportError) -> Self {
        UploadError::TransportFailure(e)
    }
}

/// Permission to submit one window, carrying the request to send.
#[derive(Debug, Clone)]
pub struct UploadTicket {
    /// Window the request was built from
    pub window_id: Uuid,
    pub request: UploadRequest,
}

/// Tracks whether the current window has been submitted.
#[derive(Debug, Clone, Default)]
pub struct UploadGuard {
    template: RequestTemplate,
    status: UploadStatus,
}

impl UploadGuard {
    pub fn new(template: RequestTemplate) -> Self {
        Self {
            template,
            status: UploadStatus::NotUploaded,
        }
    }

    /// Check preconditions without changing state and build the request.
    pub fn preview(
        &self,
        phase: CollectionPhase,
        window: &SampleWindow,
        is_collision: bool,
    ) -> Result<UploadRequest, UploadError> {
        match self.status {
            UploadStatus::Uploaded => return Err(UploadError::AlreadyUploaded),
            UploadStatus::InFlight => return Err(UploadError::InProgress),
            UploadStatus::NotUploaded => {}
        }
        if phase != CollectionPhase::Ready || !window.is_complete() {
            return Err(UploadError::NotReady);
        }
        Ok(self.template.build(window, is_collision))
    }

    /// Claim the window for submission.
    ///
    /// On success the status becomes `InFlight` until [`UploadGuard::finish`].
    pub fn begin(
        &mut self,
        phase: CollectionPhase,
        window: &SampleWindow,
        is_collision: bool,
    ) -> Result<UploadTicket, UploadError> {
        let request = self.preview(phase, window, is_collision)?;
        self.status = UploadStatus::InFlight;
        Ok(UploadTicket {
            window_id: window.id(),
            request,
        })
    }

    /// Record the transport outcome of the in-flight submission.
    pub fn finish(&mut self, success: bool) {
        if self.status == UploadStatus::InFlight {
            self.status = if success {
                UploadStatus::Uploaded
            } else {
                UploadStatus::NotUploaded
            };
        }
    }

    pub fn reset(&mut self) {
        self.status = UploadStatus::NotUploaded;
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn is_uploaded(&self) -> bool {
        self.status == UploadStatus::Uploaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::SensorSample;
    use chrono::Utc;

    fn full_window() -> SampleWindow {
        let mut window = SampleWindow::new(1);
        window
            .push(SensorSample::new(Utc::now(), [0.0; 3], [0.0; 3]))
            .unwrap();
        window
    }

    #[test]
    fn test_not_ready_before_completion() {
        let mut guard = UploadGuard::default();
        let partial = SampleWindow::new(5);

        assert_eq!(
            guard.begin(CollectionPhase::Collecting, &partial, true).err(),
            Some(UploadError::NotReady)
        );
        assert_eq!(guard.status(), UploadStatus::NotUploaded);
    }

    #[test]
    fn test_single_flight_then_uploaded() {
        let mut guard = UploadGuard::default();
        let window = full_window();

        let ticket = guard.begin(CollectionPhase::Ready, &window, true).unwrap();
        assert_eq!(ticket.window_id, window.id());
        assert_eq!(ticket.request.samples.len(), 1);

        assert_eq!(
            guard.begin(CollectionPhase::Ready, &window, true).err(),
            Some(UploadError::InProgress)
        );

        guard.finish(true);
        assert!(guard.is_uploaded());
        assert_eq!(
            guard.begin(CollectionPhase::Ready, &window, false).err(),
            Some(UploadError::AlreadyUploaded)
        );
    }

    #[test]
    fn test_failure_is_retryable() {
        let mut guard = UploadGuard::default();
        let window = full_window();

        guard.begin(CollectionPhase::Ready, &window, true).unwrap();
        guard.finish(false);
        assert_eq!(guard.status(), UploadStatus::NotUploaded);
        assert!(guard.begin(CollectionPhase::Ready, &window, true).is_ok());
    }

    #[test]
    fn test_finish_without_flight_is_ignored() {
        let mut guard = UploadGuard::default();
        guard.finish(true);
        assert!(!guard.is_uploaded());
    }
}
