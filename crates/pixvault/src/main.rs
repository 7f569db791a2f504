//! pixvault maintenance CLI
//!
//! Batch tooling for a pixvault cache root. The only subcommand today is
//! `prune`, the periodic job that expires stale entries and reaps
//! unreferenced blobs; it must never run inline with request serving.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;

use cli::Commands;
use tracing_subscriber::EnvFilter;

/// Log filter from `RUST_LOG`, defaulting to `info` so per-file prune
/// activity is visible without any environment setup.
fn log_filter(directives: Option<String>) -> EnvFilter {
    match directives {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::new("info"),
    }
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_writer(std::io::stderr)
        .try_init();

    let cli = cli::parse();
    let exit_code = match cli.command {
        Commands::Prune { root, json } => commands::prune(&root, json),
    };
    std::process::exit(exit_code);
}
