//! Sync command implementation.

use crate::SyncArgs;
use datamirror_engine::{HttpRemoteSource, SyncConfig, SyncEngine, SyncReport};
use datamirror_store::FsObjectStore;
use datamirror_types::SyncScope;
use std::path::Path;
use tracing::info;

/// Runs one sync convergence and prints its report as JSON.
///
/// Per-file failures do not abort the run, but they do fail the command so
/// schedulers notice the run was not clean.
pub fn run(
    store_root: &Path,
    config: &SyncConfig,
    args: &SyncArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Mirroring {}{} into {:?}", args.base_url, args.page, store_root);

    let report = execute(store_root, config, args)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_clean() {
        Ok(())
    } else {
        Err(format!("sync completed with {} file failures", report.failures.len()).into())
    }
}

/// Builds the collaborators and runs the engine once.
pub(crate) fn execute(
    store_root: &Path,
    config: &SyncConfig,
    args: &SyncArgs,
) -> Result<SyncReport, Box<dyn std::error::Error>> {
    let store = FsObjectStore::open(store_root)?;
    let remote = HttpRemoteSource::new(&args.base_url, config);
    let scope = SyncScope::new(&args.page, &args.prefix);
    let engine = SyncEngine::new(config.clone(), remote, store);
    Ok(engine.synchronize(&scope)?)
}
