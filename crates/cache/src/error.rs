//! Error types for the cache crate

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for cache operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error during cache operations
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(pixvault::cache::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "link")
        operation: String,
    },

    /// Expire sidecar content could not be parsed
    #[error("Malformed expire sidecar {}: {message}", path.display())]
    #[diagnostic(
        code(pixvault::cache::metadata),
        help("A corrupt sidecar indicates a bug or external tampering, not a cache miss")
    )]
    Metadata {
        /// The sidecar file that failed to parse
        path: Box<Path>,
        /// Description of the parse failure
        message: String,
    },

    /// Entry path resolves outside the configured cache root
    #[error("Path {} escapes cache root {}", path.display(), root.display())]
    #[diagnostic(code(pixvault::cache::path_escape))]
    PathEscape {
        /// The offending entry path
        path: Box<Path>,
        /// The configured cache root
        root: Box<Path>,
    },

    /// Configuration error
    #[error("Cache configuration error: {message}")]
    #[diagnostic(code(pixvault::cache::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl Error {
    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }

    /// Create a malformed-sidecar error
    #[must_use]
    pub fn metadata(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.as_ref().into(),
            message: message.into(),
        }
    }

    /// Create a path-escape error
    #[must_use]
    pub fn path_escape(path: impl AsRef<Path>, root: impl AsRef<Path>) -> Self {
        Self::PathEscape {
            path: path.as_ref().into(),
            root: root.as_ref().into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;
