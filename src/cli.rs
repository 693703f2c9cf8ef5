//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `chainpatch`.
#[derive(Debug, Parser)]
#[command(
    name = "chainpatch",
    version,
    about = "Apply, probe, and drift-check ordered registration patches"
)]
pub struct Cli {
    /// Settings shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the configured locations.
#[derive(Debug, Default, Args)]
pub struct GlobalArgs {
    /// Directory containing the `.patch` unit files.
    #[arg(long, global = true, value_name = "DIR")]
    pub units: Option<PathBuf>,
    /// Ledger file recording upstream checks.
    #[arg(long, global = true, value_name = "PATH")]
    pub ledger: Option<PathBuf>,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply (or reverse) the unit set to a tree.
    Apply {
        /// Root of the target tree.
        #[arg(value_name = "TREE_ROOT")]
        tree_root: PathBuf,
        /// Report what would happen without writing.
        #[arg(long)]
        dry_run: bool,
        /// Undo applied units instead of applying them.
        #[arg(long)]
        reverse: bool,
    },
    /// Dry-run the unit set against a fresh upstream snapshot.
    Check {
        /// Branch, tag, or revision to fetch.
        #[arg(value_name = "UPSTREAM_REF")]
        upstream_ref: String,
        /// Upstream git URL.
        #[arg(long)]
        url: Option<String>,
        /// Fetch timeout in seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Show recorded verdicts for an upstream revision.
    Ledger {
        /// Resolved revision or the ref that was checked.
        revision: String,
        /// Print every entry, oldest first.
        #[arg(long)]
        history: bool,
    },
    /// List the unit set in application order.
    Units,
}
