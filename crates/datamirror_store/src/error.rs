//! Error types for object-store operations.

use std::io;
use thiserror::Error;

/// Result type for object-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during object-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The key cannot name an object in this store.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The backing store rejected the operation.
    #[error("store backend error: {0}")]
    Backend(String),
}
