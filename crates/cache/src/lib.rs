//! Content-addressed file cache with TTL sidecars and garbage collection
//!
//! This crate is the persistence core beneath the pixvault storage backends:
//! - Blobs stored once per distinct content, keyed by SHA-1 digest
//! - Logical entries hard-linked to blobs, with plain-text expire sidecars
//! - HTTP-style lifetimes: origin `max_age` and dominant shared `max_age_shared`
//! - An offline pruner that expires entries and reaps unreferenced blobs
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   files/<aa>/<bb>/<remaining-hex>        blobs (content-addressed)
//!   <namespace>/<aa>/<bb>/<remaining-hex>  entries (key-addressed hard links)
//!   ...same path + ".max_age"              expire sidecars
//! ```
//!
//! The facade is [`FileCache`]; everything else backs it. All operations are
//! plain blocking filesystem calls with no in-process shared state, so
//! independent processes can safely share one cache root.

mod atomic;
mod cas;
mod error;
mod expire;
mod file_cache;
mod prune;

pub use cas::{is_blob_name, CasStore, FILES_DIR};
pub use error::{Error, Result};
pub use expire::{sidecar_path, ExpireFile, EXPIRE_EXT};
pub use file_cache::{FileCache, FileCacheResult};
pub use prune::{PruneStats, Pruner};
