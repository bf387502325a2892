//! Error types for the photo export tool
//!
//! Only the configuration-level failures here abort a run: an unrecognized
//! library layout or a database that cannot be staged/opened at all.
//! Per-asset lookup misses are not errors; they are absent values handled
//! with fallbacks and counted by the planner.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the photo export tool
#[derive(Error, Debug)]
pub enum ExportError {
    /// Neither supported metadata layout was found under the library root
    #[error("No supported library layout found at '{0}'. Expected 'database/photos.db' (modern) or 'Database/Library.apdb' (legacy).")]
    UnknownLibraryLayout(PathBuf),

    /// Copying a catalog database into the staging directory failed
    #[error("Failed to stage catalog database '{path}': {source}")]
    Staging {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A catalog query or connection failure
    #[error("Catalog database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Internal catalog access failure (e.g. a poisoned connection lock)
    #[error("Catalog access error: {0}")]
    CatalogAccess(String),

    /// General I/O error
    #[error("IO error: {0}")]
    IoError(String),

    /// Writing to the export destination failed
    #[error("Destination error for '{path}': {message}")]
    Destination { path: PathBuf, message: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ExportError>;

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::IoError(err.to_string())
    }
}
