//! Remote file name type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The name of a file as published by a remote source.
///
/// Names are opaque and unique within a scope. They come straight from the
/// remote listing (for directory-index sources this is the raw `href` value,
/// which may contain slashes or a leading slash) and are compared verbatim
/// against names recovered from object-store keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileName(String);

impl FileName {
    /// Creates a file name from a raw listing entry.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name, returning the underlying string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FileName {
    fn from(name: String) -> Self {
        Self(name)
    }
}
