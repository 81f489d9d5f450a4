//! Object store trait definition.

use crate::error::StoreResult;
use bytes::Bytes;
use datamirror_types::{ObjectMeta, Signature};

/// A keyed object store holding the mirrored copy of a remote source.
///
/// Stores are **flat key/value spaces**. Keys are opaque strings produced by
/// a sync scope; stores do not understand remote names, prefixes, or change
/// markers beyond persisting them.
///
/// # Invariants
///
/// - `put` replaces any existing object under the key in one step; readers
///   never observe a partially written object
/// - `signature` distinguishes "no such key" (`Ok(None)`) from a failed
///   lookup (`Err`)
/// - `delete` of a missing key succeeds, so retried deletions are harmless
/// - Stores must be `Send + Sync` for concurrent per-file operations
///
/// # Implementors
///
/// - [`super::MemoryObjectStore`] - For testing
/// - [`super::FsObjectStore`] - For persistent storage on a local directory
pub trait ObjectStore: Send + Sync {
    /// Lists all keys starting with `prefix`, in lexicographic order.
    ///
    /// An empty prefix lists every key in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    fn list_by_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Returns the stored signature for `key`, or `None` if the key is
    /// absent.
    ///
    /// The signature pairs the stored content length with the change marker
    /// recorded at upload time.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the lookup fails. A missing
    /// key is not an error.
    fn signature(&self, key: &str) -> StoreResult<Option<Signature>>;

    /// Stores `content` under `key`, replacing any existing object.
    ///
    /// The metadata is persisted with the object and comes back through
    /// [`ObjectStore::signature`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails. A failed
    /// put leaves any previous object intact.
    fn put(&self, key: &str, content: Bytes, meta: ObjectMeta) -> StoreResult<()>;

    /// Removes the object under `key`, along with its metadata.
    ///
    /// Deleting a missing key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the removal fails.
    fn delete(&self, key: &str) -> StoreResult<()>;
}
