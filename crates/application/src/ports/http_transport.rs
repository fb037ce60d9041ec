//! HTTP transport port

use std::time::Duration;

use async_trait::async_trait;
use tenancy_domain::{ApiRequest, ApiResponse};

/// Failures below the HTTP layer.
///
/// A response with an error status is *not* a transport error; it is
/// returned as an `ApiResponse` and classified by the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No response within the timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A response started but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The request could not be built (bad URL, header or body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other failure before the request was sent.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// True if the request was sent but no usable response came back.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection(_) | Self::Body(_)
        )
    }
}

/// Port for executing HTTP requests.
///
/// This trait abstracts the HTTP client implementation, allowing
/// the application layer to be independent of specific HTTP libraries.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a fully prepared request and returns whatever response arrives.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if no response could be obtained.
    async fn send(
        &self,
        request: &ApiRequest,
        timeout: Duration,
    ) -> Result<ApiResponse, TransportError>;
}
