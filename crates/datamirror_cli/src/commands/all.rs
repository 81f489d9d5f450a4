//! All command implementation.
//!
//! Runs the sync job and then the snapshot job in one invocation, the way a
//! scheduler would trigger a full refresh. A run-level sync error aborts
//! before the snapshot; per-file sync failures do not.

use crate::{SnapshotArgs, SyncArgs};
use datamirror_engine::SyncConfig;
use std::path::Path;

/// Runs sync then snapshot and prints one combined JSON document.
pub fn run(
    store_root: &Path,
    config: &SyncConfig,
    sync_args: &SyncArgs,
    snapshot_args: &SnapshotArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let sync_report = super::sync::execute(store_root, config, sync_args)?;
    let snapshot_report = super::snapshot::execute(store_root, config, snapshot_args)?;

    let failures = sync_report.failures.len();
    let combined = serde_json::json!({
        "sync": sync_report,
        "snapshot": snapshot_report,
    });
    println!("{}", serde_json::to_string_pretty(&combined)?);

    if failures == 0 {
        Ok(())
    } else {
        Err(format!("sync completed with {} file failures", failures).into())
    }
}
