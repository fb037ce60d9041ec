//! Persistent storage adapters.

mod file_token_storage;

pub use file_token_storage::FileTokenStorage;
