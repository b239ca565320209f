//! Transport collaborator for collision-data submissions.
//!
//! A [`Transport`] performs exactly one network exchange per call. Retrying is
//! left to the caller.

use crate::upload::request::UploadRequest;
use std::future::Future;

/// URL of the collision-data collection endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://www.loenkorea.com/api/collision-data/save-json";

/// Successful response from the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, verbatim
    pub body: String,
}

/// Transport error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Client construction or configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned a non-success status
    Server { status: u16, message: String },
    /// JSON serialization error
    Serialization(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Config(msg) => write!(f, "Transport config error: {msg}"),
            TransportError::Network(msg) => write!(f, "Transport network error: {msg}"),
            TransportError::Server { status, message } => {
                write!(f, "Server error ({status}): {message}")
            }
            TransportError::Serialization(msg) => {
                write!(f, "Transport serialization error: {msg}")
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Submits an [`UploadRequest`] to an endpoint with replace (PUT) semantics.
pub trait Transport: Send + Sync + 'static {
    fn put(
        &self,
        endpoint: &str,
        request: &UploadRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// HTTP transport backed by reqwest.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a transport whose requests give up after `timeout`.
    pub fn new(timeout: std::time::Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl Transport for HttpTransport {
    async fn put(
        &self,
        endpoint: &str,
        request: &UploadRequest,
    ) -> Result<TransportResponse, TransportError> {
        let body =
            serde_json::to_vec(request).map_err(|e| TransportError::Serialization(e.to_string()))?;

        let response = self
            .client
            .put(endpoint)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "No response body".to_string());

        if !status.is_success() {
            return Err(TransportError::Server {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(TransportResponse {
            status: status.as_u16(),
            body: text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Server {
            status: 503,
            message: "maintenance".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("503"));
        assert!(display.contains("maintenance"));
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let transport = HttpTransport::new(std::time::Duration::from_secs(2)).unwrap();
        let request = UploadRequest {
            situation: "test".to_string(),
            is_collision: false,
            platform: "android".to_string(),
            samples: Vec::new(),
        };

        // Port 9 (discard) on loopback is not expected to accept connections
        let result = transport.put("http://127.0.0.1:9/", &request).await;
        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
