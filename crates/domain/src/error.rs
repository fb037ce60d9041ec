//! Validation errors raised before anything touches the network.

use thiserror::Error;

/// A request or configuration was rejected during validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The base URL does not parse or is not HTTP(S).
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A request path cannot be joined onto the base URL.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The configured trace header is not a valid header name.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    /// The request body could not be encoded as JSON.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A limit or timeout is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A resource id cannot be placed in a URL path segment.
    #[error("invalid resource id: {0:?}")]
    InvalidIdentifier(String),
}

/// Result alias for validation.
pub type DomainResult<T> = Result<T, DomainError>;
