//! # DataMirror Store
//!
//! Object store trait and implementations for DataMirror.
//!
//! This crate provides the destination side of a mirror: a flat, keyed
//! object store holding file content plus the change marker recorded when
//! each object was uploaded. Stores do not understand remote names or sync
//! scopes - key translation happens upstream.
//!
//! ## Design Principles
//!
//! - Stores are flat key/value spaces; keys are opaque strings
//! - A put replaces the whole object in one step, never partially
//! - Missing keys are data (`Ok(None)`), not errors
//! - Must be `Send + Sync` for concurrent per-file operations
//!
//! ## Available Stores
//!
//! - [`MemoryObjectStore`] - For testing, with operation counters and
//!   scripted failures
//! - [`FsObjectStore`] - For persistent storage on a local directory
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use datamirror_store::{MemoryObjectStore, ObjectStore};
//! use datamirror_types::{ObjectMeta, Signature};
//!
//! let store = MemoryObjectStore::new();
//! store
//!     .put("pr/data.txt", Bytes::from_static(b"rows"), ObjectMeta::new("v1"))
//!     .unwrap();
//! let sig = store.signature("pr/data.txt").unwrap();
//! assert_eq!(sig, Some(Signature::new(4, "v1")));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod fs;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;
pub use store::ObjectStore;
