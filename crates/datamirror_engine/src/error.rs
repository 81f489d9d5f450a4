//! Error types for sync and snapshot operations.

use datamirror_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors from talking to the remote source about a single file.
///
/// These stay scoped to the file that raised them: the engine records them
/// in the run report and moves on to the next file.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote answered with a non-success status code.
    #[error("remote returned status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The request never produced a usable response.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the underlying failure.
        message: String,
    },
}

/// Errors from retrieving or reading the remote listing page.
#[derive(Debug, Error)]
pub enum ListingError {
    /// The listing page could not be fetched.
    #[error("listing fetch failed: {0}")]
    Remote(#[from] RemoteError),

    /// The listing page body was unreadable.
    #[error("listing body unreadable: {0}")]
    Body(String),
}

/// Errors that abort a whole sync run.
///
/// Per-file failures never surface here; they are carried in the run report.
/// A run only fails outright when neither side can be enumerated, when it is
/// cancelled, or when another run already holds the engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote listing could not be resolved.
    #[error("remote listing failed: {0}")]
    Listing(#[from] ListingError),

    /// The object store could not be enumerated.
    #[error("object store failed: {0}")]
    Store(#[from] StoreError),

    /// Another sync run is already in progress on this engine.
    #[error("a sync run is already in progress")]
    RunInProgress,

    /// The run was cancelled.
    #[error("sync run cancelled")]
    Cancelled,
}

/// Errors from an API snapshot job.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The API document could not be fetched.
    #[error("API fetch failed: {0}")]
    Remote(#[from] RemoteError),

    /// The snapshot could not be stored.
    #[error("object store failed: {0}")]
    Store(#[from] StoreError),

    /// The API returned a body that is not valid JSON.
    #[error("API body is not valid JSON: {0}")]
    InvalidBody(String),
}
