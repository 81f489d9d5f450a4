//! DataMirror CLI
//!
//! Command-line jobs for mirroring remote data into a local object store.
//!
//! # Commands
//!
//! - `sync` - Converge the store onto a remote directory listing
//! - `snapshot` - Capture a JSON API document into the store
//! - `all` - Run sync, then snapshot

mod commands;

use clap::{Args, Parser, Subcommand};
use datamirror_engine::SyncConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// DataMirror command-line sync jobs.
#[derive(Parser)]
#[command(name = "datamirror")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory of the local object store
    #[arg(
        global = true,
        long,
        env = "DATAMIRROR_STORE_ROOT",
        default_value = "./mirror"
    )]
    store_root: PathBuf,

    /// Timeout in seconds applied to every remote request
    #[arg(
        global = true,
        long,
        env = "DATAMIRROR_TIMEOUT_SECS",
        default_value_t = 30
    )]
    timeout_secs: u64,

    /// User-Agent header sent with every remote request
    #[arg(global = true, long, env = "DATAMIRROR_USER_AGENT")]
    user_agent: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converge the store onto a remote directory listing
    Sync(SyncArgs),

    /// Capture a JSON API document into the store
    Snapshot(SnapshotArgs),

    /// Run sync, then snapshot, and print one combined report
    All {
        #[command(flatten)]
        sync: SyncArgs,

        #[command(flatten)]
        snapshot: SnapshotArgs,
    },

    /// Show version information
    Version,
}

/// Options for mirroring a remote directory.
#[derive(Args)]
struct SyncArgs {
    /// Base URL of the remote host
    #[arg(long, env = "DATAMIRROR_BASE_URL")]
    base_url: String,

    /// Listing page path fetched from the base URL
    #[arg(long, env = "DATAMIRROR_PAGE", default_value = "/")]
    page: String,

    /// Object-store key prefix for mirrored files
    #[arg(long, env = "DATAMIRROR_PREFIX", default_value = "")]
    prefix: String,

    /// Worker threads for per-file probes, uploads, and deletions
    #[arg(long, env = "DATAMIRROR_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,
}

/// Options for capturing a JSON API document.
#[derive(Args)]
struct SnapshotArgs {
    /// URL of the JSON API endpoint
    #[arg(long, env = "DATAMIRROR_API_URL")]
    api_url: String,

    /// Query parameter as KEY=VALUE; repeatable
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Dataset name embedded in snapshot keys
    #[arg(long, env = "DATAMIRROR_DATASET")]
    dataset: String,

    /// Object-store key prefix for snapshots
    #[arg(long, env = "DATAMIRROR_API_PREFIX", default_value = "")]
    api_prefix: String,

    /// Write a timestamped key instead of overwriting the latest snapshot
    #[arg(long)]
    history: bool,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {:?}", raw)),
    }
}

fn base_config(cli: &Cli) -> SyncConfig {
    let mut config = SyncConfig::new().with_timeout(Duration::from_secs(cli.timeout_secs));
    if let Some(user_agent) = &cli.user_agent {
        config = config.with_user_agent(user_agent);
    }
    config
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; reports go to stdout, logs to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Sync(args) => {
            let config = base_config(&cli).with_concurrency(args.concurrency);
            commands::sync::run(&cli.store_root, &config, args)?;
        }
        Commands::Snapshot(args) => {
            let config = base_config(&cli);
            commands::snapshot::run(&cli.store_root, &config, args)?;
        }
        Commands::All { sync, snapshot } => {
            let config = base_config(&cli).with_concurrency(sync.concurrency);
            commands::all::run(&cli.store_root, &config, sync, snapshot)?;
        }
        Commands::Version => {
            println!("DataMirror v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
