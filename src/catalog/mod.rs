//! Library catalog module
//!
//! A photo library is a bundle directory whose relational metadata comes in
//! one of two generations: the modern single-file layout
//! (`database/photos.db`) or the legacy two-file layout
//! (`Database/Library.apdb` plus `Database/ImageProxies.apdb`). This module
//! probes which layout is present, stages private copies of the database
//! files into a temporary directory, and opens the matching [`Catalog`]
//! implementation over them.
//!
//! # Submodules
//!
//! - `traits` - The catalog query contract and row types
//! - `legacy` - Two-file layout implementation
//! - `modern` - Unified single-file layout implementation
//! - `locator` - Resource folder/file-code derivation heuristics

pub mod legacy;
pub mod locator;
pub mod modern;
pub mod traits;

pub use traits::{
    Album, AssetDetail, BoxedCatalog, Catalog, ModelResource, ResourceKey, SchemaGeneration,
};

use crate::core::error::{ExportError, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Modern catalog database, relative to the library root.
const MODERN_DB: &str = "database/photos.db";

/// Legacy main catalog database, relative to the library root.
const LEGACY_DB: &str = "Database/Library.apdb";

/// Legacy edited-resource store, relative to the library root.
const LEGACY_PROXIES_DB: &str = "Database/ImageProxies.apdb";

/// Subtree holding original captures, both generations.
const MASTERS_DIR: &str = "Masters";

/// Subtree holding edited renditions and companion movies (modern layout).
const MODEL_RESOURCES_DIR: &str = "resources/modelresources";

/// Subtree holding edited proxies (legacy layout).
const IMAGE_PROXIES_DIR: &str = "ImageProxies/Apple/Resource";

/// Determine the metadata layout present under a library root.
///
/// The probe runs once, before any resolution begins. A root containing
/// neither database file is a fatal configuration error.
pub fn probe_schema_generation(root: &Path) -> Result<SchemaGeneration> {
    if root.join(MODERN_DB).is_file() {
        return Ok(SchemaGeneration::Modern);
    }
    if root.join(LEGACY_DB).is_file() {
        return Ok(SchemaGeneration::Legacy);
    }
    Err(ExportError::UnknownLibraryLayout(root.to_path_buf()))
}

/// An opened photo library: root path, detected generation, the catalog
/// connection over the staged database copies, and the staging directory
/// itself (removed when the library is dropped).
pub struct Library {
    root: PathBuf,
    generation: SchemaGeneration,
    catalog: BoxedCatalog,
    _staging: TempDir,
}

impl Library {
    /// Probe, stage and open a library.
    ///
    /// The database files are copied into a private temporary directory
    /// before being opened, so the original library is never touched and
    /// external modification during a run cannot corrupt the read pass.
    pub fn open(root: &Path) -> Result<Self> {
        let generation = probe_schema_generation(root)?;
        info!(
            "Opening {} library at {}",
            generation,
            root.display()
        );

        let staging = TempDir::new().map_err(|e| ExportError::Staging {
            path: root.to_path_buf(),
            source: e,
        })?;

        let catalog: BoxedCatalog = match generation {
            SchemaGeneration::Modern => {
                let db = stage_database(&staging, &root.join(MODERN_DB))?;
                Box::new(modern::ModernCatalog::open(&db)?)
            }
            SchemaGeneration::Legacy => {
                let db = stage_database(&staging, &root.join(LEGACY_DB))?;
                let proxies = stage_database(&staging, &root.join(LEGACY_PROXIES_DB))?;
                Box::new(legacy::LegacyCatalog::open(&db, &proxies)?)
            }
        };

        Ok(Self {
            root: root.to_path_buf(),
            generation,
            catalog,
            _staging: staging,
        })
    }

    /// The library root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The detected metadata layout.
    pub fn generation(&self) -> SchemaGeneration {
        self.generation
    }

    /// The catalog opened over the staged database copies.
    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Directory holding original captures.
    pub fn masters_dir(&self) -> PathBuf {
        self.root.join(MASTERS_DIR)
    }

    /// Directory holding edited renditions and companion movies
    /// (modern layout).
    pub fn model_resources_dir(&self) -> PathBuf {
        self.root.join(MODEL_RESOURCES_DIR)
    }

    /// Directory holding edited proxies (legacy layout).
    pub fn image_proxies_dir(&self) -> PathBuf {
        self.root.join(IMAGE_PROXIES_DIR)
    }
}

/// Copy one catalog database into the staging directory and return the
/// staged path.
fn stage_database(staging: &TempDir, src: &Path) -> Result<PathBuf> {
    let file_name = src
        .file_name()
        .ok_or_else(|| ExportError::Staging {
            path: src.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
        })?;
    let dst = staging.path().join(file_name);
    fs::copy(src, &dst).map_err(|e| ExportError::Staging {
        path: src.to_path_buf(),
        source: e,
    })?;
    debug!("Staged {} -> {}", src.display(), dst.display());
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_empty_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = probe_schema_generation(dir.path()).unwrap_err();
        assert!(matches!(err, ExportError::UnknownLibraryLayout(_)));
    }

    #[test]
    fn test_probe_prefers_modern_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("database")).unwrap();
        fs::create_dir_all(dir.path().join("Database")).unwrap();
        fs::write(dir.path().join(MODERN_DB), b"").unwrap();
        fs::write(dir.path().join(LEGACY_DB), b"").unwrap();
        assert_eq!(
            probe_schema_generation(dir.path()).unwrap(),
            SchemaGeneration::Modern
        );
    }

    #[test]
    fn test_probe_legacy_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Database")).unwrap();
        fs::write(dir.path().join(LEGACY_DB), b"").unwrap();
        assert_eq!(
            probe_schema_generation(dir.path()).unwrap(),
            SchemaGeneration::Legacy
        );
    }
}
