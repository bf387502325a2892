//! Legacy (two-file) catalog implementation
//!
//! The oldest supported layout splits the metadata across two databases: the
//! main catalog (`Library.apdb`, albums/versions/masters) and the edited
//! proxy store (`ImageProxies.apdb`), which is attached to the same
//! connection. Versions carry no validity predicate in this layout (every
//! album member is exportable), and resources are keyed by opaque uuid
//! strings rather than model ids. Companion movies do not exist here.

use crate::catalog::traits::{
    album_from_row, Album, AssetDetail, Catalog, ModelResource, ResourceKey, SchemaGeneration,
};
use crate::core::error::{ExportError, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Album subclass marker for user-visible albums in the two-file layout.
const ALBUM_SUBCLASS: i64 = 3;

/// Catalog over staged copies of `Library.apdb` and `ImageProxies.apdb`.
pub struct LegacyCatalog {
    /// Wrapped in Mutex because rusqlite::Connection is not Sync.
    conn: Mutex<Connection>,
}

impl LegacyCatalog {
    /// Open the staged main database read-only and attach the staged proxy
    /// store as `proxies`.
    pub fn open(library_db: &Path, proxies_db: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            library_db,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute(
            "ATTACH DATABASE ?1 AS proxies",
            [proxies_db.to_string_lossy().into_owned()],
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

impl Catalog for LegacyCatalog {
    fn generation(&self) -> SchemaGeneration {
        SchemaGeneration::Legacy
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
                        IFNULL(v.adjustmentUuid, 'UNADJUSTED') \
                 FROM RKVersion v \
                 INNER JOIN RKMaster m ON v.masterUuid = m.uuid \
                 WHERE v.modelId = ?1",
                [asset_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((master_uuid, image_path, file_name, adjustment_uuid)) = row else {
            return Ok(None);
        };
        let (Some(image_path), Some(file_name)) = (image_path, file_name) else {
            return Ok(None);
        };

        Ok(Some(AssetDetail {
            id: asset_id,
            master_uuid,
            image_path,
            file_name,
            adjustment_uuid,
            special_type: None,
            master_model_id: None,
        }))
    }

    fn find_edited_resource(&self, adjustment_tag: &str) -> Result<Option<ModelResource>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT resourceUuid, filename FROM proxies.RKModelResource \
                 WHERE resourceTag = ?1",
                [adjustment_tag],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.and_then(|(uuid, filename)| match (uuid, filename) {
            (Some(uuid), Some(filename)) => Some(ModelResource {
                key: ResourceKey::Tag(uuid),
                filename,
            }),
            _ => None,
        }))
    }

    fn find_companion_resource(&self, _attached_model_id: i64) -> Result<Option<ModelResource>> {
        // The two-file layout predates live photos; there is nothing to find.
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdb::{legacy_proxies_schema, legacy_schema};

    fn open_fixture<F: FnOnce(&Connection, &Connection)>(
        seed: F,
    ) -> (tempfile::TempDir, LegacyCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("Library.apdb");
        let proxies = dir.path().join("ImageProxies.apdb");
        {
            let lib_conn = Connection::open(&library).unwrap();
            lib_conn.execute_batch(legacy_schema()).unwrap();
            let proxy_conn = Connection::open(&proxies).unwrap();
            proxy_conn.execute_batch(legacy_proxies_schema()).unwrap();
            seed(&lib_conn, &proxy_conn);
        }
        let catalog = LegacyCatalog::open(&library, &proxies).unwrap();
        (dir, catalog)
    }

    #[test]
    fn test_list_albums_uses_legacy_subclass() {
        let (_dir, catalog) = open_fixture(|lib, _| {
            lib.execute_batch(
                "INSERT INTO RKAlbum (modelId, name, albumSubclass) VALUES
                     (1, 'Vacation', 3),
                     (2, 'printAlbum', 3),
                     (3, 'Unified-style', 2);",
            )
            .unwrap();
        });

        let albums = catalog.list_albums(None).unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].name, "Vacation");
    }

    #[test]
    fn test_get_asset_has_no_validity_predicate() {
        let (_dir, catalog) = open_fixture(|lib, _| {
            lib.execute_batch(
                "INSERT INTO RKMaster (modelId, uuid, imagePath) VALUES
                     (10, 'm-1', '2012/Roll 1/IMG_1.JPG');
                 INSERT INTO RKVersion (modelId, masterUuid, fileName, adjustmentUuid) VALUES
                     (100, 'm-1', 'IMG_1.JPG', NULL);",
            )
            .unwrap();
        });

        // No isMissing/isInTrash/showInLibrary columns to filter on: every
        // album member comes back.
        let asset = catalog.get_asset(100).unwrap().unwrap();
        assert_eq!(asset.adjustment_uuid, "UNADJUSTED");
        assert_eq!(asset.special_type, None);
        assert_eq!(asset.master_model_id, None);
    }

    #[test]
    fn test_edited_resources_come_from_attached_store() {
        let (_dir, catalog) = open_fixture(|_, proxies| {
            proxies
                .execute_batch(
                    "INSERT INTO RKModelResource (resourceTag, resourceUuid, filename) VALUES
                         ('adj-9', 'Qx7abcdef', 'IMG_1_edited.JPG');",
                )
                .unwrap();
        });

        let resource = catalog.find_edited_resource("adj-9").unwrap().unwrap();
        assert_eq!(resource.key, ResourceKey::Tag("Qx7abcdef".to_string()));
        assert_eq!(resource.filename, "IMG_1_edited.JPG");
        assert!(catalog.find_edited_resource("absent").unwrap().is_none());
    }

    #[test]
    fn test_companion_lookup_is_always_absent() {
        let (_dir, catalog) = open_fixture(|_, _| {});
        assert!(catalog.find_companion_resource(10).unwrap().is_none());
    }
}
