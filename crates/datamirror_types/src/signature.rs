//! Change signatures and stored-object metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cheap proxy for a file's content, used to detect changes without
/// downloading.
///
/// Two signatures are equal when **both** fields are equal. The change
/// marker is an opaque token (for HTTP sources, the raw `Last-Modified`
/// header value). It is never parsed: a remote that reformats its markers
/// causes one spurious re-upload, which is acceptable; interpreting the
/// marker and getting it wrong would not be.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Content size in bytes.
    pub size: u64,
    /// Opaque change marker, empty when the source does not provide one.
    pub change_marker: String,
}

impl Signature {
    /// Creates a new signature.
    #[must_use]
    pub fn new(size: u64, change_marker: impl Into<String>) -> Self {
        Self {
            size,
            change_marker: change_marker.into(),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "size={}, marker={:?}", self.size, self.change_marker)
    }
}

/// Metadata stored alongside an object.
///
/// Carries the change marker that was observed on the remote at upload
/// time. The stored signature for later comparisons is reconstructed as
/// `(stored content length, meta.change_marker)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// The remote change marker captured when this object was written.
    pub change_marker: String,
}

impl ObjectMeta {
    /// Creates metadata carrying the given change marker.
    #[must_use]
    pub fn new(change_marker: impl Into<String>) -> Self {
        Self {
            change_marker: change_marker.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_equality_needs_both_fields() {
        let a = Signature::new(100, "Tue, 01 Jul 2025 10:00:00 GMT");
        let b = Signature::new(100, "Tue, 01 Jul 2025 10:00:00 GMT");
        let size_drift = Signature::new(105, "Tue, 01 Jul 2025 10:00:00 GMT");
        let marker_drift = Signature::new(100, "Wed, 02 Jul 2025 10:00:00 GMT");

        assert_eq!(a, b);
        assert_ne!(a, size_drift);
        assert_ne!(a, marker_drift);
    }

    #[test]
    fn markers_compare_verbatim() {
        // Same instant, different spelling: these must NOT compare equal.
        let rfc1123 = Signature::new(10, "Tue, 01 Jul 2025 10:00:00 GMT");
        let iso = Signature::new(10, "2025-07-01T10:00:00Z");
        assert_ne!(rfc1123, iso);
    }

    #[test]
    fn empty_marker_is_a_valid_signature() {
        let sig = Signature::new(0, "");
        assert_eq!(sig, Signature::new(0, String::new()));
    }

    #[test]
    fn meta_roundtrips_through_json() {
        let meta = ObjectMeta::new("Tue, 01 Jul 2025 10:00:00 GMT");
        let json = serde_json::to_string(&meta).unwrap();
        let back: ObjectMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }

    #[test]
    fn signature_display() {
        let sig = Signature::new(42, "T1");
        assert_eq!(format!("{sig}"), "size=42, marker=\"T1\"");
    }
}
