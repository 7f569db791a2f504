//! Subcommand implementations

use crate::cli::{EXIT_CLI, EXIT_OK, EXIT_PRUNE};
use pixvault_cache::{Error, Pruner};
use std::path::Path;
use tracing::{info, warn};

/// Run the pruner over a cache root and map the outcome to an exit code.
pub fn prune(root: &Path, json: bool) -> i32 {
    if !root.exists() {
        let err = Error::configuration(format!("cache root {} does not exist", root.display()));
        eprintln!("{:?}", miette::Report::new(err));
        return EXIT_CLI;
    }

    match Pruner::new(root).run() {
        Ok(stats) => {
            info!(
                entries_removed = stats.entries_removed,
                blobs_removed = stats.blobs_removed,
                "prune complete"
            );
            if json {
                match serde_json::to_string(&stats) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "could not serialize prune stats"),
                }
            }
            EXIT_OK
        }
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            EXIT_PRUNE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixvault_cache::FileCache;
    use tempfile::TempDir;

    #[test]
    fn test_prune_missing_root_fails() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("never-created");
        assert_eq!(prune(&missing, false), EXIT_CLI);
    }

    #[test]
    fn test_prune_empty_root_succeeds() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(prune(tmp.path(), false), EXIT_OK);
    }

    #[test]
    fn test_prune_removes_expired_entries() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new("TEST", tmp.path());
        let entry = tmp.path().join("default/ab/cd/stale");
        cache.put(&entry, b"stale bytes", None, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));

        assert_eq!(prune(tmp.path(), true), EXIT_OK);
        assert!(!entry.exists());
    }
}
