//! The single error shape observed by API callers.
//!
//! Every failure, whether the server answered with an error status, the
//! request never got a response, or the request could not be built, ends up
//! as a [`NormalizedError`]. `message`, `code` and `http_status` are always
//! populated so UI code can display them without inspecting transport
//! internals.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::DomainError;
use crate::response::StatusCode;

/// Machine-readable error codes produced by the client itself.
pub mod codes {
    /// Request was sent but no response arrived (includes timeouts).
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    /// Request was never sent.
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
    /// The session could not be recovered by a token refresh.
    pub const SESSION_EXPIRED: &str = "SESSION_EXPIRED";
    /// Too many requests are already waiting on the in-flight refresh.
    pub const REFRESH_QUEUE_FULL: &str = "REFRESH_QUEUE_FULL";
    /// Waiting on the in-flight refresh took too long.
    pub const REFRESH_TIMEOUT: &str = "REFRESH_TIMEOUT";
    /// A response body did not match the endpoint schema.
    pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";
}

/// Where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    /// A response with an error status was received.
    Server,
    /// The request was sent but no response was received.
    Network,
    /// The request was never sent.
    Client,
}

/// Uniform error returned by every API call.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct NormalizedError {
    /// Human-readable message, never empty.
    pub message: String,
    /// Machine-readable code, never empty.
    pub code: String,
    /// HTTP status of the response, `0` when no response was received.
    pub http_status: u16,
    /// Extra structured information, usually field-level validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
    /// Failure origin.
    pub origin: ErrorOrigin,
}

impl NormalizedError {
    /// Builds a server-origin error, falling back to status-derived values
    /// for anything the server did not provide.
    #[must_use]
    pub fn server(
        http_status: u16,
        message: Option<String>,
        code: Option<String>,
        details: Option<Map<String, Value>>,
    ) -> Self {
        let status = StatusCode::new(http_status);
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| status.fallback_message());
        let code = code
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| status.error_code().to_string());

        Self {
            message,
            code,
            http_status,
            details,
            origin: ErrorOrigin::Server,
        }
    }

    /// Builds a network-origin error (request sent, no response).
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: non_empty(message.into(), "Network error, please check your connection"),
            code: codes::NETWORK_ERROR.to_string(),
            http_status: 0,
            details: None,
            origin: ErrorOrigin::Network,
        }
    }

    /// Builds the network error used when a request exceeds its timeout.
    #[must_use]
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::network(format!("Request timed out after {timeout_ms}ms"))
            .with_detail("timeout_ms", Value::from(timeout_ms))
    }

    /// Builds a client-origin error (request never sent).
    #[must_use]
    pub fn client(message: impl Into<String>) -> Self {
        Self {
            message: non_empty(message.into(), "An unexpected error occurred"),
            code: codes::UNKNOWN_ERROR.to_string(),
            http_status: 0,
            details: None,
            origin: ErrorOrigin::Client,
        }
    }

    /// Builds the error delivered to every request when a token refresh
    /// fails. The underlying cause, if any, is kept in `details`.
    #[must_use]
    pub fn session_expired(cause: Option<&Self>) -> Self {
        let mut error = Self {
            message: "Your session has expired, please sign in again".to_string(),
            code: codes::SESSION_EXPIRED.to_string(),
            http_status: 401,
            details: None,
            origin: ErrorOrigin::Client,
        };
        if let Some(cause) = cause {
            error = error
                .with_detail("cause_code", Value::from(cause.code.clone()))
                .with_detail("cause_status", Value::from(cause.http_status))
                .with_detail("cause_message", Value::from(cause.message.clone()));
        }
        error
    }

    /// Builds the error returned when the refresh waiter queue is full.
    #[must_use]
    pub fn refresh_queue_full(limit: usize) -> Self {
        Self {
            message: format!("Too many requests waiting for session refresh (limit {limit})"),
            code: codes::REFRESH_QUEUE_FULL.to_string(),
            http_status: 0,
            details: None,
            origin: ErrorOrigin::Client,
        }
    }

    /// Builds the error returned when a waiter gives up on the in-flight refresh.
    #[must_use]
    pub fn refresh_timeout(timeout_ms: u64) -> Self {
        Self {
            message: format!("Timed out after {timeout_ms}ms waiting for session refresh"),
            code: codes::REFRESH_TIMEOUT.to_string(),
            http_status: 0,
            details: None,
            origin: ErrorOrigin::Network,
        }
    }

    /// Builds the error for a response body that does not match its schema.
    #[must_use]
    pub fn invalid_response(http_status: u16, message: impl Into<String>) -> Self {
        Self {
            message: non_empty(message.into(), "Unexpected response from server"),
            code: codes::INVALID_RESPONSE.to_string(),
            http_status,
            details: None,
            origin: ErrorOrigin::Client,
        }
    }

    /// Adds a single entry to `details`.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Returns true for a server 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.origin == ErrorOrigin::Server && self.http_status == 401
    }

    /// Returns true when no response was received.
    #[must_use]
    pub fn is_network(&self) -> bool {
        self.origin == ErrorOrigin::Network
    }
}

impl From<DomainError> for NormalizedError {
    fn from(error: DomainError) -> Self {
        Self::client(error.to_string())
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
