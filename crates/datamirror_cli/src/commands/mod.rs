//! CLI command implementations.

pub mod all;
pub mod snapshot;
pub mod sync;
