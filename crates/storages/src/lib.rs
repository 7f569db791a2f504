//! Storage backend adapters over the pixvault file cache
//!
//! Each adapter computes a logical entry path under the cache root and
//! delegates reads and writes to [`pixvault_cache::FileCache`]:
//! - [`ResultStorage`]: finished render results, keyed by request URL, with a
//!   WebP-variant namespace split
//! - [`SourceStorage`]: raw origin fetches, keyed by storage key
//!
//! The [`ttl`] module carries the intake contract from the fetch layer:
//! `Cache-Control` directives become the two lifetimes the cache persists.

mod result;
mod source;
pub mod ttl;

pub use pixvault_cache::{Error, Result};
pub use result::{ResultStorage, ResultStorageResult};
pub use source::SourceStorage;
pub use ttl::TtlDirectives;
