//! Offline cache pruning
//!
//! Two sequential passes over a cache root, meant to run as a periodic
//! maintenance job, never on the request path:
//!
//! 1. **Expire entries**: walk the whole tree (skipping the blob subtree),
//!    load every `.max_age` sidecar, and delete expired entries together with
//!    their sidecars.
//! 2. **Reap orphaned blobs**: walk only `files/` and delete every blob whose
//!    hard-link count has dropped to one, meaning no entry references it any
//!    more.
//!
//! Pass 1 must fully complete before pass 2 looks at any link count;
//! otherwise a blob whose last reference expired in the same run would be
//! misclassified. A single file's failure is logged and skipped so one bad
//! entry cannot stall maintenance.

use crate::cas::{is_blob_name, FILES_DIR};
use crate::expire::{ExpireFile, EXPIRE_EXT};
use crate::file_cache::FileCache;
use crate::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Counters reported by a prune run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PruneStats {
    /// Expired entries removed in pass 1 (entry plus sidecar each count once)
    pub entries_removed: usize,
    /// Orphaned blobs removed in pass 2
    pub blobs_removed: usize,
}

/// Batch pruner for one cache root
#[derive(Debug)]
pub struct Pruner {
    root: PathBuf,
    cache: FileCache,
}

impl Pruner {
    /// Create a pruner over `root`. The root must exist when [`run`] is
    /// called.
    ///
    /// [`run`]: Pruner::run
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            cache: FileCache::new("PRUNE", root.clone()),
            root,
        }
    }

    /// Run both passes in order and report what was removed.
    pub fn run(&self) -> Result<PruneStats> {
        if !self.root.exists() {
            return Err(Error::configuration(format!(
                "cache root {} does not exist",
                self.root.display()
            )));
        }
        let mut stats = PruneStats::default();
        self.prune_expired_entries(&mut stats);
        self.prune_orphaned_blobs(&mut stats);
        Ok(stats)
    }

    /// Pass 1: delete expired entry references and their sidecars.
    fn prune_expired_entries(&self, stats: &mut PruneStats) {
        let walker = WalkDir::new(&self.root).into_iter().filter_entry(|e| {
            // The blob subtree holds no sidecars; it belongs to pass 2
            e.depth() == 0 || !(e.file_type().is_dir() && e.file_name() == FILES_DIR)
        });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                info!(dir = %entry.path().display(), "entering directory");
                continue;
            }
            let is_sidecar = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(EXPIRE_EXT));
            if is_sidecar {
                self.prune_if_expired(entry.path(), stats);
            }
        }
    }

    /// Check one sidecar and delete its entry when expired.
    fn prune_if_expired(&self, sidecar: &Path, stats: &mut PruneStats) {
        let mut expire = ExpireFile::default();
        match expire.load(sidecar) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                warn!(path = %sidecar.display(), error = %e, "could not load expire sidecar");
                return;
            }
        }
        if !expire.is_expired() {
            return;
        }

        let Some(entry_path) = entry_path_for_sidecar(sidecar) else {
            warn!(path = %sidecar.display(), "sidecar name is not valid UTF-8");
            return;
        };
        info!(path = %entry_path.display(), "deleting expired entry");
        match self.cache.remove(&entry_path) {
            Ok(()) => stats.entries_removed += 1,
            Err(e) => {
                warn!(path = %entry_path.display(), error = %e, "failed to remove expired entry");
            }
        }
    }

    /// Pass 2: delete blobs with no remaining entry references.
    fn prune_orphaned_blobs(&self, stats: &mut PruneStats) {
        let files_root = self.root.join(FILES_DIR);
        if !files_root.exists() {
            return;
        }

        for entry in WalkDir::new(&files_root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                info!(dir = %entry.path().display(), "entering directory");
                continue;
            }
            // Ignore anything that is not a finished blob, e.g. in-flight
            // temporary files from concurrent writers
            let is_blob = entry
                .file_name()
                .to_str()
                .is_some_and(is_blob_name);
            if !is_blob {
                continue;
            }

            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "could not stat blob");
                    continue;
                }
            };
            if link_count(&meta) != 1 {
                continue;
            }
            info!(path = %entry.path().display(), "deleting orphaned blob");
            match fs::remove_file(entry.path()) {
                Ok(()) => stats.blobs_removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "failed to remove blob");
                }
            }
        }
    }
}

fn entry_path_for_sidecar(sidecar: &Path) -> Option<PathBuf> {
    let name = sidecar.file_name()?.to_str()?;
    let stem = name.strip_suffix(EXPIRE_EXT)?;
    Some(sidecar.with_file_name(stem))
}

#[cfg(unix)]
fn link_count(meta: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.nlink()
}

#[cfg(not(unix))]
fn link_count(_meta: &fs::Metadata) -> u64 {
    // Link counts are unavailable; report blobs as still referenced
    2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expire::sidecar_path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_entry(cache: &FileCache, path: &Path, data: &[u8], max_age: Option<u64>) {
        cache.put(path, data, max_age, None).unwrap();
    }

    #[test]
    fn test_run_requires_existing_root() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("no-such-root");
        assert!(Pruner::new(&missing).run().is_err());
    }

    #[test]
    fn test_expired_entry_and_orphaned_blob_are_removed() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new("TEST", tmp.path());
        let entry = tmp.path().join("default/ab/cd/expired");

        // max_age unset serializes as 0, so the entry expires immediately
        write_entry(&cache, &entry, b"stale bytes", None);
        std::thread::sleep(Duration::from_millis(20));

        let stats = Pruner::new(tmp.path()).run().unwrap();
        assert_eq!(stats.entries_removed, 1);
        assert_eq!(stats.blobs_removed, 1);
        assert!(!entry.exists());
        assert!(!sidecar_path(&entry).exists());
        let blobs = WalkDir::new(tmp.path().join(FILES_DIR))
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();
        assert_eq!(blobs, 0);
    }

    #[test]
    fn test_live_entries_survive() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new("TEST", tmp.path());
        let entry = tmp.path().join("default/ab/cd/live");

        write_entry(&cache, &entry, b"fresh bytes", Some(3600));

        let stats = Pruner::new(tmp.path()).run().unwrap();
        assert_eq!(stats.entries_removed, 0);
        assert_eq!(stats.blobs_removed, 0);
        assert!(cache.get(&entry).unwrap().found);
    }

    #[test]
    fn test_blob_with_surviving_referrer_is_kept() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new("TEST", tmp.path());
        let expired = tmp.path().join("default/aa/bb/expired");
        let live = tmp.path().join("default/cc/dd/live");

        // Same content behind both keys: one blob, two references
        write_entry(&cache, &expired, b"shared payload", None);
        write_entry(&cache, &live, b"shared payload", Some(3600));
        std::thread::sleep(Duration::from_millis(20));

        let stats = Pruner::new(tmp.path()).run().unwrap();
        assert_eq!(stats.entries_removed, 1);
        // The live entry still holds a link, so the blob survives
        assert_eq!(stats.blobs_removed, 0);
        assert_eq!(cache.get(&live).unwrap().data, b"shared payload");
    }

    #[test]
    fn test_all_siblings_are_visited() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new("TEST", tmp.path());
        let entries: Vec<_> = (0..4)
            .map(|i| tmp.path().join(format!("default/ab/cd/expired{i}")))
            .collect();
        for entry in &entries {
            write_entry(&cache, entry, format!("payload {}", entry.display()).as_bytes(), None);
        }
        std::thread::sleep(Duration::from_millis(20));

        let stats = Pruner::new(tmp.path()).run().unwrap();
        assert_eq!(stats.entries_removed, 4);
        assert_eq!(stats.blobs_removed, 4);
    }

    #[test]
    fn test_corrupt_sidecar_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new("TEST", tmp.path());
        let good = tmp.path().join("default/ab/cd/expired");
        let bad = tmp.path().join("default/ab/cd/corrupt");

        write_entry(&cache, &good, b"expired payload", None);
        write_entry(&cache, &bad, b"corrupt payload", Some(3600));
        fs::write(sidecar_path(&bad), "garbage").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let stats = Pruner::new(tmp.path()).run().unwrap();
        // The corrupt sidecar is logged and skipped; the walk continues
        assert_eq!(stats.entries_removed, 1);
        assert!(bad.exists());
    }

    #[test]
    fn test_non_blob_files_in_cas_subtree_untouched() {
        let tmp = TempDir::new().unwrap();
        let stray_dir = tmp.path().join("files/2a/ae");
        fs::create_dir_all(&stray_dir).unwrap();
        // Simulates an in-flight temporary file from a concurrent writer
        let stray = stray_dir.join(".tmpXyZ012");
        fs::write(&stray, b"partial write").unwrap();

        let stats = Pruner::new(tmp.path()).run().unwrap();
        assert_eq!(stats.blobs_removed, 0);
        assert!(stray.exists());
    }
}
