//! Snapshot command implementation.

use crate::SnapshotArgs;
use datamirror_engine::{
    HttpApiClient, SnapshotConfig, SnapshotJob, SnapshotMode, SnapshotReport, SyncConfig,
};
use datamirror_store::FsObjectStore;
use std::path::Path;
use tracing::info;

/// Runs one API snapshot and prints its report as JSON.
pub fn run(
    store_root: &Path,
    config: &SyncConfig,
    args: &SnapshotArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Snapshotting {} into {:?}", args.api_url, store_root);

    let report = execute(store_root, config, args)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Builds the collaborators and runs the snapshot job once.
pub(crate) fn execute(
    store_root: &Path,
    config: &SyncConfig,
    args: &SnapshotArgs,
) -> Result<SnapshotReport, Box<dyn std::error::Error>> {
    let store = FsObjectStore::open(store_root)?;
    let client = HttpApiClient::new(config);
    let snapshot_config = SnapshotConfig::new(&args.api_url, &args.dataset)
        .with_prefix(&args.api_prefix)
        .with_query(args.params.clone());
    let job = SnapshotJob::new(snapshot_config, client, store);

    let mode = if args.history {
        SnapshotMode::History
    } else {
        SnapshotMode::Latest
    };
    Ok(job.run(mode)?)
}
