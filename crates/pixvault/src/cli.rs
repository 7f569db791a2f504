//! Command-line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Successful exit
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Maintenance run failed partway
pub const EXIT_PRUNE: i32 = 3;

/// Maintenance tooling for the pixvault file cache
#[derive(Debug, Parser)]
#[command(name = "pixvault", version, about)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Expire stale entries and reap unreferenced blobs under a cache root
    Prune {
        /// Cache root directory
        #[arg(env = "PIXVAULT_CACHE_ROOT")]
        root: PathBuf,

        /// Print removal counters as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

/// Parse process arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
