//! Fixture library builder
//!
//! [`TestLibrary`] assembles a real on-disk library bundle inside a
//! temporary directory: catalog rows through rusqlite, plus the
//! corresponding master/rendition/companion files. Row insertion and file
//! writing are separate calls so tests can create every inconsistency the
//! resolver has to survive (rows without files, files without rows).
//!
//! Methods panic on failure; this is test tooling and a broken fixture
//! should fail the test immediately.

use crate::catalog::locator::{locate_model_id, locate_resource_tag};
use crate::catalog::{Library, SchemaGeneration};
use crate::testdb::generator::MockContent;
use crate::testdb::{legacy_proxies_schema, legacy_schema, modern_schema};
use rusqlite::Connection;
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Album subclass used for exportable albums per layout.
const MODERN_ALBUM_SUBCLASS: i64 = 2;
const LEGACY_ALBUM_SUBCLASS: i64 = 3;

/// Specification of one version row.
#[derive(Debug, Clone)]
pub struct VersionSpec {
    pub id: i64,
    pub master_uuid: String,
    pub file_name: String,
    pub adjustment_uuid: Option<String>,
    pub special_type: Option<i64>,
    pub is_missing: bool,
    pub is_in_trash: bool,
    pub show_in_library: bool,
}

impl VersionSpec {
    /// A plain, visible, unadjusted version.
    pub fn new(id: i64, master_uuid: &str, file_name: &str) -> Self {
        Self {
            id,
            master_uuid: master_uuid.to_string(),
            file_name: file_name.to_string(),
            adjustment_uuid: None,
            special_type: None,
            is_missing: false,
            is_in_trash: false,
            show_in_library: true,
        }
    }

    /// Mark the version as carrying a real edit.
    pub fn adjustment(mut self, tag: &str) -> Self {
        self.adjustment_uuid = Some(tag.to_string());
        self
    }

    /// Set the live/HDR marker.
    pub fn special_type(mut self, value: i64) -> Self {
        self.special_type = Some(value);
        self
    }

    /// Hide the version from the library.
    pub fn hidden(mut self) -> Self {
        self.show_in_library = false;
        self
    }

    /// Put the version in the trash.
    pub fn in_trash(mut self) -> Self {
        self.is_in_trash = true;
        self
    }

    /// Flag the version as missing.
    pub fn missing(mut self) -> Self {
        self.is_missing = true;
        self
    }
}

/// A throwaway on-disk library bundle.
pub struct TestLibrary {
    dir: TempDir,
    generation: SchemaGeneration,
    conn: Connection,
    proxies: Option<Connection>,
}

impl TestLibrary {
    /// Create a modern-layout bundle with an empty catalog.
    pub fn modern() -> Self {
        let dir = TempDir::new().expect("create fixture dir");
        let db_dir = dir.path().join("database");
        fs::create_dir_all(&db_dir).expect("create database dir");
        let conn = Connection::open(db_dir.join("photos.db")).expect("create photos.db");
        conn.execute_batch(modern_schema()).expect("modern schema");
        Self {
            dir,
            generation: SchemaGeneration::Modern,
            conn,
            proxies: None,
        }
    }

    /// Create a legacy-layout bundle with empty catalogs.
    pub fn legacy() -> Self {
        let dir = TempDir::new().expect("create fixture dir");
        let db_dir = dir.path().join("Database");
        fs::create_dir_all(&db_dir).expect("create Database dir");
        let conn = Connection::open(db_dir.join("Library.apdb")).expect("create Library.apdb");
        conn.execute_batch(legacy_schema()).expect("legacy schema");
        let proxies =
            Connection::open(db_dir.join("ImageProxies.apdb")).expect("create ImageProxies.apdb");
        proxies
            .execute_batch(legacy_proxies_schema())
            .expect("proxies schema");
        Self {
            dir,
            generation: SchemaGeneration::Legacy,
            conn,
            proxies: Some(proxies),
        }
    }

    /// Root directory of the bundle.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Open the bundle as a real [`Library`] (probe, stage, connect).
    pub fn open(&self) -> Library {
        Library::open(self.root()).expect("open fixture library")
    }

    /// Insert an exportable album.
    pub fn add_album(&self, id: i64, name: &str) {
        let subclass = match self.generation {
            SchemaGeneration::Modern => MODERN_ALBUM_SUBCLASS,
            SchemaGeneration::Legacy => LEGACY_ALBUM_SUBCLASS,
        };
        self.conn
            .execute(
                "INSERT INTO RKAlbum (modelId, name, albumSubclass) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, name, subclass],
            )
            .expect("insert album");
    }

    /// Insert a master row and write its file under `Masters/`.
    pub fn add_master(&self, model_id: i64, uuid: &str, image_path: &str) {
        self.add_master_row(model_id, uuid, image_path);
        self.write_file(
            &self.root().join("Masters").join(image_path),
            &MockContent::jpeg(seed_for(image_path)),
        );
    }

    /// Insert a master row without writing any file.
    pub fn add_master_row(&self, model_id: i64, uuid: &str, image_path: &str) {
        match self.generation {
            SchemaGeneration::Modern => self
                .conn
                .execute(
                    "INSERT INTO RKMaster (modelId, uuid, imagePath, isMissing, isInTrash) \
                     VALUES (?1, ?2, ?3, 0, 0)",
                    rusqlite::params![model_id, uuid, image_path],
                )
                .expect("insert master"),
            SchemaGeneration::Legacy => self
                .conn
                .execute(
                    "INSERT INTO RKMaster (modelId, uuid, imagePath) VALUES (?1, ?2, ?3)",
                    rusqlite::params![model_id, uuid, image_path],
                )
                .expect("insert master"),
        };
    }

    /// Insert a version row.
    pub fn add_version(&self, spec: VersionSpec) {
        match self.generation {
            SchemaGeneration::Modern => self
                .conn
                .execute(
                    "INSERT INTO RKVersion \
                     (modelId, masterUuid, fileName, adjustmentUuid, specialType, \
                      isMissing, isInTrash, showInLibrary) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![
                        spec.id,
                        spec.master_uuid,
                        spec.file_name,
                        spec.adjustment_uuid,
                        spec.special_type,
                        spec.is_missing as i64,
                        spec.is_in_trash as i64,
                        spec.show_in_library as i64,
                    ],
                )
                .expect("insert version"),
            SchemaGeneration::Legacy => self
                .conn
                .execute(
                    "INSERT INTO RKVersion (modelId, masterUuid, fileName, adjustmentUuid) \
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![
                        spec.id,
                        spec.master_uuid,
                        spec.file_name,
                        spec.adjustment_uuid,
                    ],
                )
                .expect("insert version"),
        };
    }

    /// Insert an album-membership row.
    pub fn link(&self, album_id: i64, version_id: i64) {
        self.conn
            .execute(
                "INSERT INTO RKAlbumVersion (albumId, versionId) VALUES (?1, ?2)",
                rusqlite::params![album_id, version_id],
            )
            .expect("insert album membership");
    }

    /// Insert an edited-rendition resource row (modern layout).
    pub fn add_edited_resource(&self, model_id: i64, tag: &str, filename: &str) {
        self.conn
            .execute(
                "INSERT INTO RKModelResource (modelId, resourceTag, UTI, filename) \
                 VALUES (?1, ?2, 'public.jpeg', ?3)",
                rusqlite::params![model_id, tag, filename],
            )
            .expect("insert edited resource");
    }

    /// Insert a companion-movie resource row (modern layout). The file name
    /// is deliberately not recorded; it has to be discovered on disk.
    pub fn add_companion_resource(&self, model_id: i64, attached_model_id: i64) {
        self.conn
            .execute(
                "INSERT INTO RKModelResource (modelId, UTI, attachedModelId) \
                 VALUES (?1, 'com.apple.quicktime-movie', ?2)",
                rusqlite::params![model_id, attached_model_id],
            )
            .expect("insert companion resource");
    }

    /// Write a file into a model-resource folder derived from a model id
    /// (modern layout).
    pub fn write_model_resource_file(&self, model_id: i64, filename: &str) {
        let location = locate_model_id(model_id as u64);
        let path = self
            .root()
            .join("resources/modelresources")
            .join(location.folder_name)
            .join(location.file_code)
            .join(filename);
        let content = if filename.to_lowercase().ends_with(".mov") {
            MockContent::quicktime(seed_for(filename))
        } else {
            MockContent::jpeg(seed_for(filename))
        };
        self.write_file(&path, &content);
    }

    /// Insert an edited-proxy row (legacy layout).
    pub fn add_proxy_resource(&self, tag: &str, uuid: &str, filename: &str) {
        self.proxies
            .as_ref()
            .expect("legacy bundle")
            .execute(
                "INSERT INTO RKModelResource (resourceTag, resourceUuid, filename) \
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![tag, uuid, filename],
            )
            .expect("insert proxy resource");
    }

    /// Write a proxy file into the folder derived from a resource uuid
    /// (legacy layout).
    pub fn write_proxy_file(&self, uuid: &str, filename: &str) {
        let (seg1, seg2) = locate_resource_tag(uuid).expect("uuid with >= 2 chars");
        let path = self
            .root()
            .join("ImageProxies/Apple/Resource")
            .join(seg1)
            .join(seg2)
            .join(uuid)
            .join(filename);
        self.write_file(&path, &MockContent::jpeg(seed_for(filename)));
    }

    fn write_file(&self, path: &PathBuf, content: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture parent dir");
        }
        fs::write(path, content).expect("write fixture file");
    }
}

/// Stable content seed derived from a file name or path.
fn seed_for(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}
