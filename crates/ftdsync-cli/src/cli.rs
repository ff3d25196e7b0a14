//! CLI argument definitions for ftdsync.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sync` | Download new distributions and update the flat-file stores |
//! | `discover` | List the distributions currently published in the catalog |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--log-level` | `info` | Tracing filter directive |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! # Incremental sync into ./sec-fails-to-deliver
//! SEC_USER_AGENT="Research Desk research@example.com" ftdsync sync
//!
//! # Rebuild every issuer file through the merge path
//! ftdsync sync --no-skip-processed --destination /data/ftd --pretty
//!
//! # What is published right now?
//! ftdsync discover --pretty
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// ftdsync - fails-to-deliver report synchroniser
#[derive(Debug, Parser)]
#[command(
    name = "ftdsync",
    author,
    version,
    about = "Incremental fails-to-deliver report synchroniser",
    long_about = "Discovers the regulator's twice-monthly fails-to-deliver archives, downloads \
the ones not yet processed under a global request-rate ceiling, resolves tickers to \
time-aware identifiers and merges the records into per-issuer and per-publication CSV files."
)]
pub struct Cli {
    /// Tracing filter directive (e.g. `info`, `ftdsync_core=debug`).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download unprocessed distributions and update the stores.
    ///
    /// Prints the run report as JSON. Exits with code 4 when no distribution
    /// contributed a record.
    ///
    /// # Examples
    ///
    ///   ftdsync sync
    ///   ftdsync sync --rate-limit 2 --retries 3
    Sync(SyncArgs),

    /// List published distributions without downloading them.
    ///
    /// # Examples
    ///
    ///   ftdsync discover --pretty
    Discover(FetchArgs),
}

/// Options shared by every command that talks to the regulator.
#[derive(Debug, Clone, Default, Args)]
pub struct FetchArgs {
    /// Client-identifying User-Agent header (overrides SEC_USER_AGENT).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Maximum requests per second across all downloads.
    #[arg(long)]
    pub rate_limit: Option<u32>,

    /// Attempts per request before giving up.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Arguments for the `sync` command.
#[derive(Debug, Clone, Default, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Root directory of the output files (overrides FTDSYNC_HOME).
    #[arg(long)]
    pub destination: Option<PathBuf>,

    /// Directory of ticker map files (overrides FTDSYNC_MAP_FILES).
    #[arg(long)]
    pub map_files: Option<PathBuf>,

    /// Reprocess distributions whose universe file already exists.
    #[arg(long, default_value_t = false)]
    pub no_skip_processed: bool,
}
