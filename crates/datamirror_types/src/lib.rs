//! # DataMirror Types
//!
//! Shared vocabulary types for DataMirror.
//!
//! This crate defines the small set of types that circulate between the
//! remote source, the object store, and the sync engine:
//!
//! - [`FileName`] - a remote file name, opaque and unique within a scope
//! - [`Signature`] - the `(size, change marker)` pair used to detect changes
//!   without downloading content
//! - [`ObjectMeta`] - metadata stored alongside an object, carrying the
//!   last-observed remote change marker
//! - [`SyncScope`] - a remote listing page paired with an object-store
//!   prefix, owning the name/key normalization for one sync run
//!
//! ## Design Principles
//!
//! - Change markers are opaque tokens. They are compared for equality and
//!   never parsed or reformatted.
//! - Name/key translation happens in exactly one place ([`SyncScope`]),
//!   so remote names and store listings always compare on equal footing.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod name;
mod scope;
mod signature;

pub use name::FileName;
pub use scope::SyncScope;
pub use signature::{ObjectMeta, Signature};
