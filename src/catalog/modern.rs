//! Modern (unified single-file) catalog implementation
//!
//! The modern layout keeps albums, versions, masters and model resources in
//! one database. Versions carry a validity predicate (`isMissing`,
//! `isInTrash`, `showInLibrary`) and a `specialType` marker for live/HDR
//! photos; model resources are keyed by numeric model ids.

use crate::catalog::traits::{
    album_from_row, Album, AssetDetail, Catalog, ModelResource, ResourceKey, SchemaGeneration,
    COMPANION_MOVIE_UTI,
};
use crate::core::error::{ExportError, Result};
use log::debug;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Album subclass marker for user-visible albums in the unified layout.
const ALBUM_SUBCLASS: i64 = 2;

/// Catalog over a staged copy of `database/photos.db`.
pub struct ModernCatalog {
    /// Wrapped in Mutex because rusqlite::Connection is not Sync.
    conn: Mutex<Connection>,
}

impl ModernCatalog {
    /// Open a staged database copy read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ExportError::CatalogAccess(e.to_string()))
    }
}

impl Catalog for ModernCatalog {
    fn generation(&self) -> SchemaGeneration {
        SchemaGeneration::Modern
    }

    fn list_albums(&self, name_prefix: Option<&str>) -> Result<Vec<Album>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT modelId, name FROM RKAlbum WHERE albumSubclass = ?1 ORDER BY modelId",
        )?;
        let rows = stmt.query_map([ALBUM_SUBCLASS], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
        })?;

        let mut albums = Vec::new();
        for row in rows {
            let (id, name) = row?;
            if let Some(album) = album_from_row(id, name, name_prefix) {
                albums.push(album);
            }
        }
        Ok(albums)
    }

    fn list_asset_ids(&self, album_id: i64) -> Result<Vec<i64>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT versionId FROM RKAlbumVersion WHERE albumId = ?1")?;
        let ids = stmt
            .query_map([album_id], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn get_asset(&self, asset_id: i64) -> Result<Option<AssetDetail>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT m.uuid, m.imagePath, v.fileName, \
                        IFNULL(v.adjustmentUuid, 'UNADJUSTED'), v.specialType, m.modelId \
                 FROM RKVersion v \
                 INNER JOIN RKMaster m ON v.masterUuid = m.uuid \
                 WHERE v.modelId = ?1 \
                   AND IFNULL(v.isMissing, 0) = 0 \
                   AND IFNULL(v.isInTrash, 0) = 0 \
                   AND IFNULL(v.showInLibrary, 1) = 1 \
                   AND IFNULL(m.isMissing, 0) = 0 \
                   AND IFNULL(m.isInTrash, 0) = 0",
                [asset_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((master_uuid, image_path, file_name, adjustment_uuid, special_type, master_model_id)) =
            row
        else {
            return Ok(None);
        };

        // A version without a stored path or name cannot be exported.
        let (Some(image_path), Some(file_name)) = (image_path, file_name) else {
            debug!("Version {} has no usable path/name, skipping", asset_id);
            return Ok(None);
        };

        Ok(Some(AssetDetail {
            id: asset_id,
            master_uuid,
            image_path,
            file_name,
            adjustment_uuid,
            special_type,
            master_model_id: Some(master_model_id),
        }))
    }

    fn find_edited_resource(&self, adjustment_tag: &str) -> Result<Option<ModelResource>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT modelId, filename FROM RKModelResource WHERE resourceTag = ?1",
                [adjustment_tag],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<String>>(1)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.and_then(|(model_id, filename)| {
            filename.map(|filename| ModelResource {
                key: ResourceKey::ModelId(model_id),
                filename,
            })
        }))
    }

    fn find_companion_resource(&self, attached_model_id: i64) -> Result<Option<ModelResource>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT modelId, filename FROM RKModelResource \
                 WHERE attachedModelId = ?1 AND UTI = ?2",
                rusqlite::params![attached_model_id, COMPANION_MOVIE_UTI],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<String>>(1)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(model_id, filename)| ModelResource {
            key: ResourceKey::ModelId(model_id),
            // Companion file names are not authoritative on disk; keep
            // whatever the row carries for logging.
            filename: filename.unwrap_or_default(),
        }))
    }
}
