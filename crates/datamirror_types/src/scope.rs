//! Sync scope: one listing page paired with one store prefix.

use crate::name::FileName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The pairing of a remote listing location and an object-store prefix
/// reconciled in one sync run.
///
/// The scope owns name/key normalization for the run: a store key is the
/// prefix concatenated with the remote name, and a name is recovered from a
/// key by stripping the **leading** prefix only. Interior repetitions of the
/// prefix inside a key are preserved, so names survive the round trip
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncScope {
    /// Remote listing location, passed verbatim to the remote lister.
    pub page: String,
    /// Object-store key prefix for this scope.
    pub prefix: String,
}

impl SyncScope {
    /// Creates a new scope.
    #[must_use]
    pub fn new(page: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            prefix: prefix.into(),
        }
    }

    /// Returns the store key for a remote file name.
    #[must_use]
    pub fn key_for(&self, name: &FileName) -> String {
        format!("{}{}", self.prefix, name.as_str())
    }

    /// Recovers the remote file name from a store key.
    ///
    /// Returns `None` for keys outside this scope: keys that do not start
    /// with the prefix, or that consist of the prefix alone.
    #[must_use]
    pub fn name_for(&self, key: &str) -> Option<FileName> {
        key.strip_prefix(&self.prefix)
            .filter(|rest| !rest.is_empty())
            .map(FileName::new)
    }
}

impl fmt::Display for SyncScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.page, self.prefix)
    }
}
