//! Content-addressed blob store
//!
//! Blobs live under `<root>/files/` keyed by the lowercase hex SHA-1 of their
//! content, sharded two levels deep to keep directory fan-out bounded:
//!
//! ```text
//! <root>/files/
//!   ab/
//!     cd/
//!       ef0123... (remaining 36 hex digits)
//! ```
//!
//! Identical payloads from unrelated logical keys resolve to the same path,
//! so the store holds each distinct content exactly once. Digest equality is
//! trusted for content equality; bytes are never re-compared.

use crate::atomic::write_atomic;
use crate::Result;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};

/// Name of the blob subtree under the cache root
pub const FILES_DIR: &str = "files";

/// Content-addressed store rooted at a cache directory
#[derive(Debug, Clone)]
pub struct CasStore {
    root: PathBuf,
}

impl CasStore {
    /// Create a store for the given cache root.
    ///
    /// Blobs are placed under `<root>/files/`; nothing is created until the
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root this store serves
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sharded blob path for a payload. Pure computation, no I/O.
    #[must_use]
    pub fn digest_path(&self, content: &[u8]) -> PathBuf {
        let hex = hex::encode(Sha1::digest(content));
        self.root
            .join(FILES_DIR)
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(&hex[4..])
    }

    /// Store a payload if its blob does not exist yet, returning the blob path.
    ///
    /// An existing file at the digest path short-circuits the write, which is
    /// what makes concurrent identical `put`s race-free: both writers resolve
    /// to the same path and the loser becomes a no-op.
    pub fn ensure_blob(&self, content: &[u8]) -> Result<PathBuf> {
        let path = self.digest_path(content);
        if path.exists() {
            return Ok(path);
        }
        write_atomic(&path, content)?;
        Ok(path)
    }
}

/// Whether a file name is a sharded blob remainder (36 hex digits).
///
/// The garbage collector uses this to ignore in-flight temporary files when
/// scanning the blob subtree.
#[must_use]
pub fn is_blob_name(name: &str) -> bool {
    name.len() == 36 && name.bytes().all(|b| b.is_ascii_hexdigit())
}
