//! Remote source traits and an in-memory test double.

use crate::error::{ListingError, RemoteError};
use bytes::Bytes;
use datamirror_types::{FileName, Signature};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lists the file names a remote source currently publishes.
pub trait RemoteLister: Send + Sync {
    /// Returns the set of file names on the given listing page.
    ///
    /// The page string is opaque to the engine; it is whatever locator the
    /// source understands.
    ///
    /// # Errors
    ///
    /// Returns a [`ListingError`] if the listing cannot be fetched or read.
    /// This is the one remote failure that aborts a whole run.
    fn list(&self, page: &str) -> Result<BTreeSet<FileName>, ListingError>;
}

/// Provides change signatures without transferring file content.
pub trait RemoteSignatureProvider: Send + Sync {
    /// Returns the current signature of the named file.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] on a non-success status or a transport
    /// failure. The engine scopes such errors to the file.
    fn signature(&self, name: &FileName) -> Result<Signature, RemoteError>;
}

/// Downloads full file content.
pub trait RemoteFetcher: Send + Sync {
    /// Returns the content of the named file.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] on a non-success status or a transport
    /// failure. The engine scopes such errors to the file.
    fn fetch(&self, name: &FileName) -> Result<Bytes, RemoteError>;
}

/// A complete remote source: listing, signatures, and content.
///
/// Blanket-implemented for anything providing all three capabilities, so
/// the engine takes one bound while tests can still stub the pieces.
pub trait RemoteSource: RemoteLister + RemoteSignatureProvider + RemoteFetcher {}

impl<T: RemoteLister + RemoteSignatureProvider + RemoteFetcher> RemoteSource for T {}

/// One file held by the mock remote.
#[derive(Debug, Clone)]
struct MockFile {
    marker: String,
    content: Bytes,
}

/// An in-memory remote source for testing.
///
/// Files are inserted with a change marker and content; signatures are
/// derived from them the way a real source would derive headers. Listing,
/// signature, and fetch failures can be scripted per file, and every call
/// is counted so tests can assert that unchanged files cost no fetches.
#[derive(Debug, Default)]
pub struct MockRemoteSource {
    files: RwLock<BTreeMap<FileName, MockFile>>,
    listing_failure: RwLock<Option<String>>,
    signature_failures: RwLock<BTreeSet<FileName>>,
    fetch_failures: RwLock<BTreeSet<FileName>>,
    list_calls: AtomicUsize,
    signature_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MockRemoteSource {
    /// Creates an empty mock remote.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a file with the given change marker and content.
    pub fn insert(
        &self,
        name: impl Into<FileName>,
        marker: impl Into<String>,
        content: impl Into<Bytes>,
    ) {
        self.files.write().insert(
            name.into(),
            MockFile {
                marker: marker.into(),
                content: content.into(),
            },
        );
    }

    /// Removes a file from the listing.
    pub fn remove(&self, name: &FileName) {
        self.files.write().remove(name);
    }

    /// Scripts all future listings to fail.
    pub fn fail_listing(&self, message: impl Into<String>) {
        *self.listing_failure.write() = Some(message.into());
    }

    /// Scripts signature probes for `name` to fail.
    pub fn fail_signature(&self, name: impl Into<FileName>) {
        self.signature_failures.write().insert(name.into());
    }

    /// Scripts fetches for `name` to fail.
    pub fn fail_fetch(&self, name: impl Into<FileName>) {
        self.fetch_failures.write().insert(name.into());
    }

    /// Returns how many listings were requested.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Returns how many signature probes were made.
    #[must_use]
    pub fn signature_calls(&self) -> usize {
        self.signature_calls.load(Ordering::Relaxed)
    }

    /// Returns how many fetches were made.
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::Relaxed)
    }
}

impl RemoteLister for MockRemoteSource {
    fn list(&self, _page: &str) -> Result<BTreeSet<FileName>, ListingError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(message) = self.listing_failure.read().clone() {
            return Err(ListingError::Remote(RemoteError::Transport { message }));
        }
        Ok(self.files.read().keys().cloned().collect())
    }
}

impl RemoteSignatureProvider for MockRemoteSource {
    fn signature(&self, name: &FileName) -> Result<Signature, RemoteError> {
        self.signature_calls.fetch_add(1, Ordering::Relaxed);
        if self.signature_failures.read().contains(name) {
            return Err(RemoteError::Transport {
                message: format!("scripted signature failure for {name}"),
            });
        }
        match self.files.read().get(name) {
            Some(file) => Ok(Signature::new(
                file.content.len() as u64,
                file.marker.clone(),
            )),
            None => Err(RemoteError::Status { status: 404 }),
        }
    }
}

impl RemoteFetcher for MockRemoteSource {
    fn fetch(&self, name: &FileName) -> Result<Bytes, RemoteError> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        if self.fetch_failures.read().contains(name) {
            return Err(RemoteError::Transport {
                message: format!("scripted fetch failure for {name}"),
            });
        }
        match self.files.read().get(name) {
            Some(file) => Ok(file.content.clone()),
            None => Err(RemoteError::Status { status: 404 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_lists_published_files() {
        let remote = MockRemoteSource::new();
        remote.insert("b.txt", "v1", "bee");
        remote.insert("a.txt", "v1", "ay");

        let names = remote.list("/any").unwrap();
        let expected: Vec<FileName> = vec!["a.txt".into(), "b.txt".into()];
        assert_eq!(names.into_iter().collect::<Vec<_>>(), expected);
        assert_eq!(remote.list_calls(), 1);
    }

    #[test]
    fn mock_signature_derives_from_content_and_marker() {
        let remote = MockRemoteSource::new();
        remote.insert("a.txt", "v2", "hello");

        let sig = remote.signature(&"a.txt".into()).unwrap();
        assert_eq!(sig, Signature::new(5, "v2"));
    }

    #[test]
    fn mock_unknown_file_is_a_404() {
        let remote = MockRemoteSource::new();
        assert!(matches!(
            remote.signature(&"ghost".into()),
            Err(RemoteError::Status { status: 404 })
        ));
        assert!(matches!(
            remote.fetch(&"ghost".into()),
            Err(RemoteError::Status { status: 404 })
        ));
    }

    #[test]
    fn mock_scripted_failures_are_per_file() {
        let remote = MockRemoteSource::new();
        remote.insert("good.txt", "v1", "fine");
        remote.insert("bad.txt", "v1", "broken");
        remote.fail_fetch("bad.txt");

        assert!(remote.fetch(&"good.txt".into()).is_ok());
        assert!(remote.fetch(&"bad.txt".into()).is_err());
        assert_eq!(remote.fetch_calls(), 2);
    }

    #[test]
    fn mock_scripted_listing_failure() {
        let remote = MockRemoteSource::new();
        remote.fail_listing("remote is down");

        assert!(matches!(
            remote.list("/any"),
            Err(ListingError::Remote(RemoteError::Transport { .. }))
        ));
    }
}
