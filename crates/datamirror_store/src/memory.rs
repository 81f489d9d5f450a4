//! In-memory object store for testing.

use crate::error::{StoreError, StoreResult};
use crate::store::ObjectStore;
use bytes::Bytes;
use datamirror_types::{ObjectMeta, Signature};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// A stored object: content plus the metadata recorded at upload time.
#[derive(Debug, Clone)]
struct StoredObject {
    content: Bytes,
    meta: ObjectMeta,
}

/// An in-memory object store.
///
/// Objects live in a `BTreeMap`, so listings are naturally ordered. Beyond
/// the [`ObjectStore`] contract, the store counts acknowledged puts and
/// deletes and can be scripted to fail on chosen keys, which lets tests
/// assert that unchanged files trigger no writes and that one failing object
/// never blocks the rest of a run.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use datamirror_store::{MemoryObjectStore, ObjectStore};
/// use datamirror_types::ObjectMeta;
///
/// let store = MemoryObjectStore::new();
/// store
///     .put("pr/data.txt", Bytes::from_static(b"rows"), ObjectMeta::new("v1"))
///     .unwrap();
/// assert_eq!(store.list_by_prefix("pr/").unwrap(), vec!["pr/data.txt"]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    failing: RwLock<BTreeSet<String>>,
    puts: AtomicU64,
    deletes: AtomicU64,
}

impl MemoryObjectStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts every future operation on `key` to fail.
    ///
    /// Listings are unaffected, so a scripted key still shows up as present.
    pub fn fail_key(&self, key: impl Into<String>) {
        self.failing.write().insert(key.into());
    }

    /// Returns the stored content for `key`, if present.
    #[must_use]
    pub fn content(&self, key: &str) -> Option<Bytes> {
        self.objects.read().get(key).map(|obj| obj.content.clone())
    }

    /// Returns the stored metadata for `key`, if present.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<ObjectMeta> {
        self.objects.read().get(key).map(|obj| obj.meta.clone())
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Returns `true` if the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Returns the number of acknowledged puts.
    #[must_use]
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Returns the number of acknowledged deletes.
    #[must_use]
    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    fn check(&self, key: &str) -> StoreResult<()> {
        if self.failing.read().contains(key) {
            return Err(StoreError::Backend(format!(
                "injected failure for key {key:?}"
            )));
        }
        Ok(())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list_by_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .objects
            .read()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn signature(&self, key: &str) -> StoreResult<Option<Signature>> {
        self.check(key)?;
        Ok(self.objects.read().get(key).map(|obj| {
            Signature::new(obj.content.len() as u64, obj.meta.change_marker.clone())
        }))
    }

    fn put(&self, key: &str, content: Bytes, meta: ObjectMeta) -> StoreResult<()> {
        self.check(key)?;
        self.objects
            .write()
            .insert(key.to_string(), StoredObject { content, meta });
        self.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.check(key)?;
        self.objects.write().remove(key);
        self.deletes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
