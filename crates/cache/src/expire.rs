//! Expiration metadata sidecars
//!
//! Every cache entry carries a small text sidecar (`<entry>.max_age`) holding
//! its HTTP-style cache lifetimes: `"<max_age>"` or `"<max_age>,<max_age_shared>"`,
//! both in seconds. The shared (CDN) lifetime dominates entirely when present,
//! mirroring the `s-maxage`/`max-age` split of `Cache-Control`. The reference
//! timestamp is the sidecar file's own modification time, so metadata is
//! re-derived fresh on every load and never cached in memory.

use crate::atomic::write_atomic;
use crate::{Error, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Suffix appended to an entry path to locate its expire sidecar
pub const EXPIRE_EXT: &str = ".max_age";

/// Expiration metadata for a single cache entry
#[derive(Debug, Clone, Default)]
pub struct ExpireFile {
    max_age: Option<u64>,
    max_age_shared: Option<u64>,
    change_date: Option<SystemTime>,
}

impl ExpireFile {
    /// Origin (private cache) lifetime in seconds
    #[must_use]
    pub fn max_age(&self) -> Option<u64> {
        self.max_age
    }

    /// Shared (CDN) lifetime in seconds; dominates `max_age` when set
    #[must_use]
    pub fn max_age_shared(&self) -> Option<u64> {
        self.max_age_shared
    }

    /// Set the origin lifetime
    pub fn set_max_age(&mut self, seconds: u64) {
        self.max_age = Some(seconds);
    }

    /// Set the shared lifetime
    pub fn set_max_age_shared(&mut self, seconds: u64) {
        self.max_age_shared = Some(seconds);
    }

    /// Load metadata from a sidecar file.
    ///
    /// Returns `Ok(false)` when the sidecar does not exist, leaving the
    /// lifetimes as constructed. A sidecar that exists but does not parse as
    /// the expected integer list is a fatal [`Error::Metadata`], never a miss.
    pub fn load(&mut self, path: &Path) -> Result<bool> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(Error::io(e, path, "metadata")),
        };
        let modified = meta.modified().map_err(|e| Error::io(e, path, "metadata"))?;

        let content = fs::read_to_string(path).map_err(|e| Error::io(e, path, "read"))?;
        let mut fields = content.trim().split(',');
        let first = fields.next().unwrap_or_default();
        self.max_age = Some(parse_seconds(first, path)?);
        self.max_age_shared = match fields.next() {
            Some(second) => Some(parse_seconds(second, path)?),
            None => None,
        };
        self.change_date = Some(modified);
        Ok(true)
    }

    /// Persist the lifetimes to a sidecar file.
    ///
    /// An explicit sidecar always carries at least one value: an unset
    /// `max_age` serializes as `0`. The write goes through a temporary file
    /// and an atomic rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut payload = self.max_age.unwrap_or(0).to_string();
        if let Some(shared) = self.max_age_shared {
            // Infallible for String targets
            let _ = write!(payload, ",{shared}");
        }
        write_atomic(path, payload.as_bytes())
    }

    /// Whether the entry is expired relative to `now`.
    ///
    /// The shared lifetime, when set, is the only one consulted. An entry
    /// with no lifetime information at all is always expired ("do not cache").
    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        let Some(change_date) = self.change_date else {
            return true;
        };
        // A sidecar mtime in the future reads as zero elapsed time
        let elapsed = now.duration_since(change_date).unwrap_or_default();

        if let Some(shared) = self.max_age_shared {
            return elapsed > Duration::from_secs(shared);
        }
        match self.max_age {
            Some(max_age) => elapsed > Duration::from_secs(max_age),
            None => true,
        }
    }

    /// Whether the entry is expired right now
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }
}

fn parse_seconds(field: &str, path: &Path) -> Result<u64> {
    field
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::metadata(path, format!("invalid TTL value {field:?}")))
}

/// Sidecar path for an entry path: the entry path with [`EXPIRE_EXT`] appended
#[must_use]
pub fn sidecar_path(entry: &Path) -> std::path::PathBuf {
    let mut os = entry.as_os_str().to_os_string();
    os.push(EXPIRE_EXT);
    std::path::PathBuf::from(os)
}
