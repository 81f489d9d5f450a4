//! Pure convergence planning.
//!
//! The decisions here are deliberately free of I/O: given listings and
//! signatures, classify every file. The engine drives the probing and acts
//! on the result.

use datamirror_types::{FileName, Signature};
use std::collections::BTreeSet;

/// What to do with one remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The stored copy is missing or stale; fetch and upload.
    Upload,
    /// The stored copy matches; leave it alone.
    Unchanged,
}

/// Classifies one remote file from its remote and stored signatures.
///
/// Signatures compare field-wise: equal size and equal change marker mean
/// unchanged. Markers are opaque tokens; a marker that merely *looks*
/// older is still a difference.
#[must_use]
pub fn decide(remote: &Signature, local: Option<&Signature>) -> Decision {
    match local {
        Some(stored) if stored == remote => Decision::Unchanged,
        _ => Decision::Upload,
    }
}

/// Names present in the store but gone from the remote listing.
///
/// These are the deletion candidates for the run. Ordering follows the
/// local set, so the result is deterministic.
#[must_use]
pub fn stale_names(local: &BTreeSet<FileName>, remote: &BTreeSet<FileName>) -> Vec<FileName> {
    local.difference(remote).cloned().collect()
}

/// One planned upload: the name and the remote signature observed while
/// planning. The signature is recorded with the object so the next run
/// sees the file as unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpload {
    /// The remote file to upload.
    pub name: FileName,
    /// The remote signature at planning time.
    pub signature: Signature,
}

/// The computed action set for one sync run.
///
/// Every successfully probed remote name lands in exactly one of `uploads`
/// or `unchanged`; `deletions` holds names that only exist locally, so it
/// is disjoint from both.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Files to fetch and upload.
    pub uploads: Vec<PlannedUpload>,
    /// Files whose stored copy already matches.
    pub unchanged: Vec<FileName>,
    /// Stale keys to delete.
    pub deletions: Vec<FileName>,
}
