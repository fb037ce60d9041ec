//! Session token handling.
//!
//! This module provides:
//! - `TokenStore`, the single owner of the access/refresh token pair
//! - `TokenStatus` for expiry reporting
//! - `MemoryTokenStorage`, a non-persistent storage medium

mod memory_storage;
mod token_store;

pub use memory_storage::MemoryTokenStorage;
pub use token_store::{TokenStatus, TokenStore};
