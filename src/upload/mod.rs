//! Submission of completed windows to the collision-data endpoint.

pub mod guard;
pub mod request;
pub mod transport;

pub use guard::{UploadError, UploadGuard, UploadStatus, UploadTicket};
pub use request::{RequestTemplate, SensorEntry, UploadRequest, WIRE_TIMESTAMP_FORMAT};
pub use transport::{Transport, TransportError, TransportResponse, DEFAULT_ENDPOINT};

#[cfg(feature = "http")]
pub use transport::HttpTransport;
