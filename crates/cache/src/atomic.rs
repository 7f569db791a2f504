//! Crash-safe file writes
//!
//! Blobs and sidecars are written to a uniquely named temporary file in the
//! destination directory, synced, and renamed into place. A reader can never
//! observe a partially written file.

use crate::{Error, Result};
use std::io::Write;
use std::path::Path;

/// Write `data` to `path` atomically, creating parent directories on demand.
///
/// A directory that already exists is success, not failure, so concurrent
/// writers racing on shard creation never conflict.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::configuration(format!("path {} has no parent directory", path.display()))
    })?;
    std::fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create_dir_all"))?;

    let mut tmp =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| Error::io(e, parent, "create"))?;
    tmp.write_all(data)
        .map_err(|e| Error::io(e, tmp.path(), "write"))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::io(e, tmp.path(), "sync"))?;
    tmp.persist(path)
        .map_err(|e| Error::io(e.error, path, "rename"))?;
    Ok(())
}
