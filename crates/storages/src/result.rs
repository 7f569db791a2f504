//! Result storage adapter
//!
//! Caches finished render results keyed by request URL. Entry paths live
//! under a per-variant namespace so WebP-negotiated responses never collide
//! with the default encoding:
//!
//! ```text
//! <root>/{auto_webp|default}/<aa>/<bb>/<remaining-hex>   hex = SHA-1(url)
//! ```
//!
//! Everything filesystem-related is delegated to [`FileCache`]; this adapter
//! only computes keys and applies the zero-TTL write skip.

use crate::ttl::TtlDirectives;
use pixvault_cache::{FileCache, Result};
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// A cached render result with response metadata
#[derive(Debug, Clone)]
pub struct ResultStorageResult {
    /// The rendered bytes
    pub data: Vec<u8>,
    /// Origin lifetime recorded at write time, in seconds
    pub max_age: Option<u64>,
    /// Shared lifetime recorded at write time, in seconds
    pub max_age_shared: Option<u64>,
    /// When the cached entry was last written
    pub last_modified: Option<SystemTime>,
}

impl ResultStorageResult {
    /// Size of the rendered bytes
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.data.len()
    }
}

/// Storage backend for final rendered results
#[derive(Debug, Clone)]
pub struct ResultStorage {
    cache: FileCache,
    root: PathBuf,
    auto_webp: bool,
}

impl ResultStorage {
    /// Create a result storage over `root`. With `auto_webp` enabled,
    /// requests accepting WebP are keyed in a separate namespace.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, auto_webp: bool) -> Self {
        let root = root.into();
        Self {
            cache: FileCache::new("RESULT_STORAGE", root.clone()),
            root,
            auto_webp,
        }
    }

    fn variant(&self, accepts_webp: bool) -> &'static str {
        if self.auto_webp && accepts_webp {
            "auto_webp"
        } else {
            "default"
        }
    }

    /// Entry path for a request URL
    #[must_use]
    pub fn entry_path(&self, url: &str, accepts_webp: bool) -> PathBuf {
        let hex = hex::encode(Sha1::digest(url.as_bytes()));
        self.root
            .join(self.variant(accepts_webp))
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(&hex[4..])
    }

    /// Cache a rendered result. Skipped entirely when the effective lifetime
    /// is zero.
    pub fn put(
        &self,
        url: &str,
        accepts_webp: bool,
        data: &[u8],
        ttl: &TtlDirectives,
    ) -> Result<()> {
        if ttl.is_no_store() {
            debug!(url, "skipping write, effective TTL is zero");
            return Ok(());
        }
        self.cache.put(
            &self.entry_path(url, accepts_webp),
            data,
            ttl.max_age,
            ttl.max_age_shared,
        )
    }

    /// Fetch a cached result, honoring the caller's cache-bypass flag.
    pub fn get(
        &self,
        url: &str,
        accepts_webp: bool,
        bypass_cache: bool,
    ) -> Result<Option<ResultStorageResult>> {
        if bypass_cache {
            info!(url, "bypassing result cache");
            return Ok(None);
        }
        let path = self.entry_path(url, accepts_webp);
        let res = self.cache.get(&path)?;
        if !res.found {
            return Ok(None);
        }
        let last_modified = self.cache.last_modified(&path)?;
        Ok(Some(ResultStorageResult {
            data: res.data,
            max_age: res.max_age,
            max_age_shared: res.max_age_shared,
            last_modified,
        }))
    }

    /// Whether a live result is cached for the URL
    pub fn exists(&self, url: &str, accepts_webp: bool) -> Result<bool> {
        self.cache.exists(&self.entry_path(url, accepts_webp))
    }

    /// When the cached result was last written, if present
    pub fn last_modified(&self, url: &str, accepts_webp: bool) -> Result<Option<SystemTime>> {
        self.cache.last_modified(&self.entry_path(url, accepts_webp))
    }

    /// Drop the cached result for the URL. Idempotent.
    pub fn remove(&self, url: &str, accepts_webp: bool) -> Result<()> {
        self.cache.remove(&self.entry_path(url, accepts_webp))
    }

    /// Root directory of this storage
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
