//! Application error types
//!
//! Every public operation of the client returns [`NormalizedError`] so
//! callers deal with a single error shape.

pub use tenancy_domain::NormalizedError;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, NormalizedError>;
