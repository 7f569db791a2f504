//! Source storage adapter
//!
//! Caches raw origin fetches (the unprocessed source image) keyed by a
//! storage key, usually the normalized origin URL. Entries live under a
//! single `source` namespace:
//!
//! ```text
//! <root>/source/<aa>/<bb>/<remaining-hex>   hex = SHA-1(key)
//! ```

use crate::ttl::TtlDirectives;
use pixvault_cache::{FileCache, Result};
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const NAMESPACE: &str = "source";

/// Storage backend for fetched origin content
#[derive(Debug, Clone)]
pub struct SourceStorage {
    cache: FileCache,
    root: PathBuf,
}

impl SourceStorage {
    /// Create a source storage over `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            cache: FileCache::new("STORAGE", root.clone()),
            root,
        }
    }

    /// Entry path for a storage key
    #[must_use]
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let hex = hex::encode(Sha1::digest(key.as_bytes()));
        self.root
            .join(NAMESPACE)
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(&hex[4..])
    }

    /// Cache origin bytes. Skipped entirely when the effective lifetime is
    /// zero.
    pub fn put(&self, key: &str, data: &[u8], ttl: &TtlDirectives) -> Result<()> {
        if ttl.is_no_store() {
            debug!(key, "skipping write, effective TTL is zero");
            return Ok(());
        }
        self.cache
            .put(&self.entry_path(key), data, ttl.max_age, ttl.max_age_shared)
    }

    /// Fetch cached origin bytes, honoring the caller's cache-bypass flag.
    pub fn get(&self, key: &str, bypass_cache: bool) -> Result<Option<Vec<u8>>> {
        if bypass_cache {
            info!(key, "bypassing source cache");
            return Ok(None);
        }
        let res = self.cache.get(&self.entry_path(key))?;
        if res.found { Ok(Some(res.data)) } else { Ok(None) }
    }

    /// Whether live origin bytes are cached for the key
    pub fn exists(&self, key: &str) -> Result<bool> {
        self.cache.exists(&self.entry_path(key))
    }

    /// Drop the cached origin bytes for the key. Idempotent.
    pub fn remove(&self, key: &str) -> Result<()> {
        self.cache.remove(&self.entry_path(key))
    }

    /// Root directory of this storage
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
