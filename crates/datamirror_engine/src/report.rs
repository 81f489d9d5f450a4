//! Run reports: what a sync did and what it could not do.

use crate::error::RemoteError;
use datamirror_store::StoreError;
use datamirror_types::FileName;
use serde::{Deserialize, Serialize};

/// The step of the per-file pipeline where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Probing the remote or stored signature.
    Signature,
    /// Downloading remote content.
    Fetch,
    /// Writing content into the store.
    Upload,
    /// Deleting a stale object.
    Delete,
}

/// Which side of the mirror raised the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The remote source.
    Remote,
    /// The object store.
    Store,
}

/// A failure scoped to one file.
///
/// One of these never aborts a run; the engine records it and keeps
/// converging the other files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// The file the failure belongs to.
    pub name: FileName,
    /// The pipeline step that failed.
    pub stage: FailureStage,
    /// The side that raised the error.
    pub kind: FailureKind,
    /// Human-readable description of the error.
    pub message: String,
}

impl FileFailure {
    /// Records a remote-side failure.
    #[must_use]
    pub fn remote(name: FileName, stage: FailureStage, error: &RemoteError) -> Self {
        Self {
            name,
            stage,
            kind: FailureKind::Remote,
            message: error.to_string(),
        }
    }

    /// Records a store-side failure.
    #[must_use]
    pub fn store(name: FileName, stage: FailureStage, error: &StoreError) -> Self {
        Self {
            name,
            stage,
            kind: FailureKind::Store,
            message: error.to_string(),
        }
    }
}

/// The outcome of one sync run.
///
/// Counts cover acknowledged operations only. Failures are listed per file,
/// ordered by name, so reports are stable run over run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Files fetched and written to the store.
    pub uploaded: u64,
    /// Stale objects removed from the store.
    pub deleted: u64,
    /// Files whose stored copy already matched.
    pub unchanged: u64,
    /// Per-file failures recorded during the run.
    pub failures: Vec<FileFailure>,
    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl SyncReport {
    /// Returns `true` if every file converged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
