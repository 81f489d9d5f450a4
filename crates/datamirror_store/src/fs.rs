//! File-system object store for persistent storage.

use crate::error::{StoreError, StoreResult};
use crate::store::ObjectStore;
use bytes::Bytes;
use datamirror_types::{ObjectMeta, Signature};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Suffix of the metadata sidecar written next to each object.
const META_SUFFIX: &str = ".meta.json";

/// Suffix of in-flight temporary files.
const TMP_SUFFIX: &str = ".tmp";

/// An object store backed by a local directory.
///
/// Each object lives at `<root>/<key>` with its metadata in a JSON sidecar
/// at `<root>/<key>.meta.json`. Keys may contain `/`, which maps onto nested
/// directories created on demand.
///
/// # Durability
///
/// Content and sidecar are written to a temporary file, fsynced, and renamed
/// into place, so readers only ever see complete objects. A crash between
/// the two renames leaves an object whose sidecar is missing; it reads back
/// with an empty change marker, and the resulting signature mismatch makes
/// the next sync rewrite it.
///
/// # Keys
///
/// Keys must name files strictly under the root: components must be
/// non-empty and must not be `.` or `..`, and the reserved bookkeeping
/// suffixes (`.meta.json`, `.tmp`) are rejected.
///
/// # Example
///
/// ```no_run
/// use bytes::Bytes;
/// use datamirror_store::{FsObjectStore, ObjectStore};
/// use datamirror_types::ObjectMeta;
///
/// let store = FsObjectStore::open("./mirror").unwrap();
/// store
///     .put("pr/data.txt", Bytes::from_static(b"rows"), ObjectMeta::new("v1"))
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a key onto its content path, validating it on the way.
    fn content_path(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("key is empty".to_string()));
        }
        if key.ends_with(META_SUFFIX) || key.ends_with(TMP_SUFFIX) {
            return Err(StoreError::InvalidKey(format!(
                "key {key:?} ends with a reserved suffix"
            )));
        }

        let mut path = self.root.clone();
        for component in key.split('/') {
            if component.is_empty() || component == "." || component == ".." {
                return Err(StoreError::InvalidKey(format!(
                    "key {key:?} does not name a file under the store root"
                )));
            }
            path.push(component);
        }
        Ok(path)
    }

    fn collect_keys(&self, dir: &Path, prefix: &str, keys: &mut Vec<String>) -> StoreResult<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.collect_keys(&path, prefix, keys)?;
            } else if !is_bookkeeping(&path) {
                if let Some(key) = self.key_of(&path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }
        Ok(())
    }

    /// Recovers the key of a content path, skipping paths that do not map
    /// back to UTF-8 keys.
    fn key_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

impl ObjectStore for FsObjectStore {
    fn list_by_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        self.collect_keys(&self.root, prefix, &mut keys)?;
        keys.sort();
        Ok(keys)
    }

    fn signature(&self, key: &str) -> StoreResult<Option<Signature>> {
        let path = self.content_path(key)?;
        let size = match fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        // A missing or malformed sidecar reads as an empty marker; the
        // signature mismatch then forces a re-upload that rewrites it.
        let marker = match fs::read(sidecar_path(&path)) {
            Ok(bytes) => serde_json::from_slice::<ObjectMeta>(&bytes)
                .map(|meta| meta.change_marker)
                .unwrap_or_default(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(Signature::new(size, marker)))
    }

    fn put(&self, key: &str, content: Bytes, meta: ObjectMeta) -> StoreResult<()> {
        let path = self.content_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let encoded =
            serde_json::to_vec(&meta).map_err(|err| StoreError::Backend(err.to_string()))?;
        write_atomic(&path, &content)?;
        write_atomic(&sidecar_path(&path), &encoded)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.content_path(key)?;
        remove_if_present(&path)?;
        remove_if_present(&sidecar_path(&path))?;
        Ok(())
    }
}

/// Returns the sidecar path for a content path.
fn sidecar_path(content: &Path) -> PathBuf {
    let mut name = content.file_name().unwrap_or_default().to_os_string();
    name.push(META_SUFFIX);
    content.with_file_name(name)
}

/// Returns `true` for the store's own sidecar and temporary files.
fn is_bookkeeping(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(META_SUFFIX) || name.ends_with(TMP_SUFFIX))
}

/// Writes `bytes` to `path` via a temporary file and an atomic rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(TMP_SUFFIX);
    let temp_path = path.with_file_name(name);

    let mut file = File::create(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;
    Ok(())
}

fn remove_if_present(path: &Path) -> StoreResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn meta(marker: &str) -> ObjectMeta {
        ObjectMeta::new(marker)
    }

    #[test]
    fn fs_open_creates_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("mirror");

        let store = FsObjectStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root);
    }

    #[test]
    fn fs_put_writes_content_and_sidecar() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();

        store
            .put("pr/data.txt", Bytes::from_static(b"rows"), meta("v1"))
            .unwrap();

        assert_eq!(fs::read(dir.path().join("pr/data.txt")).unwrap(), b"rows");
        assert!(dir.path().join("pr/data.txt.meta.json").is_file());
    }

    #[test]
    fn fs_signature_pairs_size_and_marker() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        store
            .put("a.txt", Bytes::from_static(b"hello"), meta("v1"))
            .unwrap();

        let sig = store.signature("a.txt").unwrap().unwrap();
        assert_eq!(sig, Signature::new(5, "v1"));
    }

    #[test]
    fn fs_signature_of_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        assert!(store.signature("ghost.txt").unwrap().is_none());
    }

    #[test]
    fn fs_missing_sidecar_reads_as_empty_marker() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        store
            .put("a.txt", Bytes::from_static(b"hello"), meta("v1"))
            .unwrap();
        fs::remove_file(dir.path().join("a.txt.meta.json")).unwrap();

        let sig = store.signature("a.txt").unwrap().unwrap();
        assert_eq!(sig, Signature::new(5, ""));
    }

    #[test]
    fn fs_malformed_sidecar_reads_as_empty_marker() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        store
            .put("a.txt", Bytes::from_static(b"hello"), meta("v1"))
            .unwrap();
        fs::write(dir.path().join("a.txt.meta.json"), b"not json").unwrap();

        let sig = store.signature("a.txt").unwrap().unwrap();
        assert_eq!(sig, Signature::new(5, ""));
    }

    #[test]
    fn fs_list_skips_sidecars_and_sorts() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        store.put("pr/b.txt", Bytes::new(), meta("m")).unwrap();
        store.put("pr/a/deep.txt", Bytes::new(), meta("m")).unwrap();
        store.put("other.txt", Bytes::new(), meta("m")).unwrap();

        assert_eq!(
            store.list_by_prefix("pr/").unwrap(),
            vec!["pr/a/deep.txt", "pr/b.txt"]
        );
        assert_eq!(
            store.list_by_prefix("").unwrap(),
            vec!["other.txt", "pr/a/deep.txt", "pr/b.txt"]
        );
    }

    #[test]
    fn fs_delete_removes_content_and_sidecar() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        store.put("a.txt", Bytes::from_static(b"x"), meta("m")).unwrap();

        store.delete("a.txt").unwrap();

        assert!(!dir.path().join("a.txt").exists());
        assert!(!dir.path().join("a.txt.meta.json").exists());
        assert!(store.list_by_prefix("").unwrap().is_empty());
    }

    #[test]
    fn fs_delete_of_missing_key_is_ok() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        assert!(store.delete("ghost.txt").is_ok());
    }

    #[test]
    fn fs_put_replaces_existing() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        store
            .put("a.txt", Bytes::from_static(b"old"), meta("v1"))
            .unwrap();
        store
            .put("a.txt", Bytes::from_static(b"newer"), meta("v2"))
            .unwrap();

        let sig = store.signature("a.txt").unwrap().unwrap();
        assert_eq!(sig, Signature::new(5, "v2"));
        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"newer");
    }

    #[test]
    fn fs_persistence_across_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = FsObjectStore::open(dir.path()).unwrap();
            store
                .put("pr/data.txt", Bytes::from_static(b"rows"), meta("v1"))
                .unwrap();
        }

        {
            let store = FsObjectStore::open(dir.path()).unwrap();
            assert_eq!(store.list_by_prefix("").unwrap(), vec!["pr/data.txt"]);
            let sig = store.signature("pr/data.txt").unwrap().unwrap();
            assert_eq!(sig, Signature::new(4, "v1"));
        }
    }

    #[test]
    fn fs_rejects_keys_that_escape_the_root() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();

        for key in ["", "/abs.txt", "a//b.txt", "../out.txt", "a/./b.txt", "a/"] {
            assert!(
                matches!(
                    store.put(key, Bytes::new(), meta("m")),
                    Err(StoreError::InvalidKey(_))
                ),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn fs_rejects_reserved_suffixes() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();

        assert!(matches!(
            store.put("a.meta.json", Bytes::new(), meta("m")),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            store.signature("a.tmp"),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn fs_stray_temp_files_do_not_list() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        store.put("a.txt", Bytes::new(), meta("m")).unwrap();
        fs::write(dir.path().join("b.txt.tmp"), b"partial").unwrap();

        assert_eq!(store.list_by_prefix("").unwrap(), vec!["a.txt"]);
    }
}
