//! File cache facade
//!
//! Maps logical entry paths to content-addressed blobs. Every storage backend
//! computes an entry path under the cache root and delegates here; this module
//! is the sole writer of entries and their expire sidecars.
//!
//! An entry is a hard link to its blob, so a blob's link count equals one plus
//! the number of live entries referencing it. The garbage collector relies on
//! that count to reap orphans; see [`crate::prune`].

use crate::cas::CasStore;
use crate::expire::{sidecar_path, ExpireFile};
use crate::{Error, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Outcome of a cache lookup
#[derive(Debug, Clone, Default)]
pub struct FileCacheResult {
    /// Whether a live, unexpired entry was found
    pub found: bool,
    /// Entry content; empty on a miss
    pub data: Vec<u8>,
    /// Origin lifetime recorded for the entry, in seconds
    pub max_age: Option<u64>,
    /// Shared lifetime recorded for the entry, in seconds
    pub max_age_shared: Option<u64>,
}

impl FileCacheResult {
    fn miss() -> Self {
        Self::default()
    }

    fn hit(data: Vec<u8>, max_age: Option<u64>, max_age_shared: Option<u64>) -> Self {
        Self {
            found: true,
            data,
            max_age,
            max_age_shared,
        }
    }
}

/// Content-addressed file cache with TTL sidecars
#[derive(Debug, Clone)]
pub struct FileCache {
    name: String,
    root: PathBuf,
    cas: CasStore,
}

impl FileCache {
    /// Create a cache over `root`. `name` tags log lines so multiple caches
    /// sharing a process stay distinguishable.
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            name: name.into(),
            cas: CasStore::new(root.clone()),
            root,
        }
    }

    /// Cache root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `data` under the entry path.
    ///
    /// The blob is deduplicated by content digest, the sidecar is written
    /// next to the entry, and the entry reference is swapped last
    /// (remove old, hard-link new). The brief window without a reference is
    /// bounded and can only surface as a spurious miss.
    pub fn put(
        &self,
        path: &Path,
        data: &[u8],
        max_age: Option<u64>,
        max_age_shared: Option<u64>,
    ) -> Result<()> {
        self.check_contained(path)?;

        let blob_path = self.cas.ensure_blob(data)?;
        debug!(
            cache = %self.name,
            path = %path.display(),
            blob = %blob_path.display(),
            "putting entry"
        );

        let mut expire = ExpireFile::default();
        if let Some(seconds) = max_age {
            expire.set_max_age(seconds);
        }
        if let Some(seconds) = max_age_shared {
            expire.set_max_age_shared(seconds);
        }
        expire.save(&sidecar_path(path))?;

        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(e, path, "remove_file")),
        }
        fs::hard_link(&blob_path, path).map_err(|e| Error::io(e, path, "link"))?;
        Ok(())
    }

    /// Look up an entry.
    ///
    /// A missing sidecar or an expired lifetime is a miss (`found == false`);
    /// expired entries are left on disk for the pruner. Any filesystem error
    /// other than not-found propagates unmodified.
    pub fn get(&self, path: &Path) -> Result<FileCacheResult> {
        self.check_contained(path)?;

        let mut expire = ExpireFile::default();
        if !expire.load(&sidecar_path(path))? {
            debug!(cache = %self.name, path = %path.display(), "no expire sidecar");
            return Ok(FileCacheResult::miss());
        }
        if expire.is_expired() {
            debug!(cache = %self.name, path = %path.display(), "entry expired");
            return Ok(FileCacheResult::miss());
        }

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Sidecar survived a crash window without its entry
                warn!(cache = %self.name, path = %path.display(), "sidecar present but entry missing");
                return Ok(FileCacheResult::miss());
            }
            Err(e) => return Err(Error::io(e, path, "read")),
        };
        Ok(FileCacheResult::hit(
            data,
            expire.max_age(),
            expire.max_age_shared(),
        ))
    }

    /// Whether a live, unexpired entry exists. Same expiry rules as [`get`],
    /// without reading content.
    ///
    /// [`get`]: FileCache::get
    pub fn exists(&self, path: &Path) -> Result<bool> {
        self.check_contained(path)?;

        let mut expire = ExpireFile::default();
        if !expire.load(&sidecar_path(path))? {
            return Ok(false);
        }
        if expire.is_expired() {
            return Ok(false);
        }
        Ok(path.exists())
    }

    /// Modification time of the entry file, or `None` when absent.
    ///
    /// Expiry is deliberately not consulted here; pair with [`exists`] when
    /// liveness matters.
    ///
    /// [`exists`]: FileCache::exists
    pub fn last_modified(&self, path: &Path) -> Result<Option<SystemTime>> {
        self.check_contained(path)?;

        match fs::metadata(path) {
            Ok(meta) => {
                let modified = meta.modified().map_err(|e| Error::io(e, path, "metadata"))?;
                Ok(Some(modified))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(e, path, "metadata")),
        }
    }

    /// Delete the entry reference and its sidecar. Idempotent; the underlying
    /// blob is never touched (the pruner reaps it once unreferenced).
    pub fn remove(&self, path: &Path) -> Result<()> {
        self.check_contained(path)?;

        remove_if_present(path)?;
        remove_if_present(&sidecar_path(path))?;
        Ok(())
    }

    /// Reject entry paths that resolve outside the cache root.
    fn check_contained(&self, path: &Path) -> Result<()> {
        let contained = match (normalize(path), normalize(&self.root)) {
            (Some(path), Some(root)) => path.starts_with(root),
            _ => false,
        };
        if contained {
            return Ok(());
        }
        warn!(
            cache = %self.name,
            path = %path.display(),
            root = %self.root.display(),
            "refusing path outside cache root"
        );
        Err(Error::path_escape(path, &self.root))
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(e, path, "remove_file")),
    }
}

/// Lexically fold `.` and `..` components so containment checks cannot be
/// defeated by traversal sequences. Purely textual: entry paths may not exist
/// yet, so symlink-aware canonicalization is not an option here.
///
/// Returns `None` when a `..` would climb above the path's start. A relative
/// path like `../<root>/x` names a sibling of the root's own parent, so the
/// containment check must treat it as an escape rather than quietly dropping
/// the leading component.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            other => out.push(other),
        }
    }
    Some(out)
}
