//! # DataMirror Engine
//!
//! Incremental sync engine mirroring remote file listings into an object
//! store.
//!
//! The engine reconciles two listings - the files a remote host publishes
//! and the keys a store holds under a prefix - and converges the store onto
//! the remote in one run:
//!
//! ```text
//! +--------------+   list/HEAD/GET    +------------+   put/delete   +-------+
//! | remote host  | <----------------- | SyncEngine | -------------> | store |
//! +--------------+                    +------------+                +-------+
//! ```
//!
//! Change detection is header-cheap: a file's `(size, change marker)`
//! signature is compared against the one recorded at upload time, and
//! content moves only when they differ. Failures on one file are reported,
//! not fatal, so a run always converges as far as the day allows and can
//! simply be run again.
//!
//! ## Modules
//!
//! - [`SyncEngine`] - the state machine driving one-shot convergence runs
//! - [`RemoteLister`]/[`RemoteSignatureProvider`]/[`RemoteFetcher`] - the
//!   remote seams, with [`HttpRemoteSource`] speaking HTTP
//! - [`listing`] - directory-index page parsing
//! - [`plan`] - pure classification of files into upload/unchanged/delete
//! - [`SnapshotJob`] - one-shot JSON API captures into the same store
//!
//! ## Example
//!
//! ```rust
//! use datamirror_engine::{MockRemoteSource, SyncConfig, SyncEngine};
//! use datamirror_store::MemoryObjectStore;
//! use datamirror_types::SyncScope;
//!
//! let remote = MockRemoteSource::new();
//! remote.insert("pr.class", "v1", "series definitions");
//!
//! let engine = SyncEngine::new(SyncConfig::new(), remote, MemoryObjectStore::new());
//! let report = engine.synchronize(&SyncScope::new("/pub/pr", "pr/")).unwrap();
//! assert_eq!(report.uploaded, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod http;
pub mod listing;
pub mod plan;
mod report;
mod snapshot;
mod source;

pub use config::{SyncConfig, DEFAULT_USER_AGENT};
pub use engine::{SyncEngine, SyncState, SyncStats};
pub use error::{ListingError, RemoteError, SnapshotError, SyncError, SyncResult};
pub use http::{HttpApiClient, HttpRemoteSource};
pub use report::{FailureKind, FailureStage, FileFailure, SyncReport};
pub use snapshot::{ApiClient, SnapshotConfig, SnapshotJob, SnapshotMode, SnapshotReport};
pub use source::{
    MockRemoteSource, RemoteFetcher, RemoteLister, RemoteSignatureProvider, RemoteSource,
};
