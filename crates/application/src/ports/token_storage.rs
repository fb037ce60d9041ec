//! Token storage port
//!
//! The storage medium holding the two session tokens. Implementations may be
//! in-memory, file-backed, or bridged to a platform keystore.

use async_trait::async_trait;

/// Errors raised by a storage medium.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The medium is not usable (locked, full, disabled).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key/value storage for session tokens.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Reads the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
