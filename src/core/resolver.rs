//! Source resolution for assets
//!
//! Turns a catalog asset row into the concrete file(s) to export: either the
//! original master capture or its edited rendition, and for live/HDR photos
//! the companion movie file. All lookup misses here are local, recoverable
//! outcomes. The master path is always available as a fallback, and a photo
//! simply exports without its companion when the movie cannot be found.

use crate::catalog::locator::{locate_model_id, locate_resource_tag};
use crate::catalog::{AssetDetail, Library, ModelResource, ResourceKey};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extension of companion movies, appended to the photo's destination
/// name so the pair never collides in the album directory.
const COMPANION_EXTENSION: &str = "mov";

/// A resolved source file plus the name it should carry in the destination
/// album directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSource {
    /// Absolute path of the file to copy/link.
    pub path: PathBuf,
    /// File name inside the destination album directory.
    pub destination_name: String,
}

/// Outcome of resolving an asset's primary file.
#[derive(Debug)]
pub enum MasterResolution {
    /// The master capture is the source.
    Master(ExportSource),
    /// The edited rendition is the source.
    Edited(ExportSource),
    /// An edit is recorded but its file could not be located; the master is
    /// used instead.
    FallbackToMaster(ExportSource),
}

impl MasterResolution {
    /// The source to export, whichever branch was taken.
    pub fn into_source(self) -> ExportSource {
        match self {
            MasterResolution::Master(s)
            | MasterResolution::Edited(s)
            | MasterResolution::FallbackToMaster(s) => s,
        }
    }

    /// Whether an edited rendition was wanted but unusable.
    pub fn is_fallback(&self) -> bool {
        matches!(self, MasterResolution::FallbackToMaster(_))
    }
}

/// Outcome of resolving a companion movie.
#[derive(Debug)]
pub enum CompanionResolution {
    /// The asset is not a live/HDR photo; nothing to do.
    NotApplicable,
    /// Companion found.
    Found(ExportSource),
    /// The asset should have a companion but it could not be located
    /// unambiguously.
    Failed,
}

/// Resolve an asset's primary export source.
///
/// The master path under the library's masters subtree is the default; an
/// edited rendition replaces it only when edits are requested, the asset's
/// adjustment marker denotes a real edit, the catalog knows the rendition,
/// and the derived file actually exists on disk. Anything short of that
/// falls back to the master without failing the asset.
pub fn resolve_master(
    library: &Library,
    asset: &AssetDetail,
    masters_only: bool,
) -> MasterResolution {
    let master = ExportSource {
        path: library.masters_dir().join(&asset.image_path),
        destination_name: asset.file_name.clone(),
    };

    if masters_only || !asset.has_adjustments() {
        return MasterResolution::Master(master);
    }

    let resource = match library.catalog().find_edited_resource(&asset.adjustment_uuid) {
        Ok(Some(resource)) => resource,
        Ok(None) => {
            debug!(
                "No edited rendition recorded for '{}' (tag {}), using master",
                asset.file_name, asset.adjustment_uuid
            );
            return MasterResolution::FallbackToMaster(master);
        }
        Err(e) => {
            warn!(
                "Edited-rendition lookup failed for '{}': {}",
                asset.file_name, e
            );
            return MasterResolution::FallbackToMaster(master);
        }
    };

    match edited_resource_path(library, &resource) {
        Some(path) if path.is_file() => MasterResolution::Edited(ExportSource {
            path,
            destination_name: asset.file_name.clone(),
        }),
        Some(path) => {
            debug!(
                "Edited rendition for '{}' not on disk at {}, using master",
                asset.file_name,
                path.display()
            );
            MasterResolution::FallbackToMaster(master)
        }
        None => {
            debug!(
                "Edited rendition for '{}' has an unusable location key, using master",
                asset.file_name
            );
            MasterResolution::FallbackToMaster(master)
        }
    }
}

/// Resolve the companion movie for a live/HDR photo.
///
/// `primary_destination_name` is the (already deduplicated) name the photo
/// itself exports under; the companion carries that name plus the movie
/// extension.
pub fn resolve_companion(
    library: &Library,
    asset: &AssetDetail,
    primary_destination_name: &str,
) -> CompanionResolution {
    if !asset.is_live_photo() {
        return CompanionResolution::NotApplicable;
    }

    let Some(master_model_id) = asset.master_model_id else {
        warn!(
            "Live photo '{}' carries no master model id, exporting without companion",
            asset.file_name
        );
        return CompanionResolution::Failed;
    };

    let resource = match library.catalog().find_companion_resource(master_model_id) {
        Ok(Some(resource)) => resource,
        Ok(None) => {
            debug!(
                "No companion movie recorded for '{}', exporting photo only",
                asset.file_name
            );
            return CompanionResolution::Failed;
        }
        Err(e) => {
            warn!("Companion lookup failed for '{}': {}", asset.file_name, e);
            return CompanionResolution::Failed;
        }
    };

    match companion_movie_path(library, &resource) {
        Some(path) => CompanionResolution::Found(ExportSource {
            path,
            destination_name: format!("{}.{}", primary_destination_name, COMPANION_EXTENSION),
        }),
        None => CompanionResolution::Failed,
    }
}

/// Derive the on-disk path of an edited rendition from its location key.
///
/// The key kind selects the heuristic: numeric ids bucket by hex digits
/// under the model-resources subtree, tag strings bucket by character codes
/// under the image-proxies subtree.
fn edited_resource_path(library: &Library, resource: &ModelResource) -> Option<PathBuf> {
    match &resource.key {
        ResourceKey::ModelId(id) => {
            let id = u64::try_from(*id).ok()?;
            let location = locate_model_id(id);
            Some(
                library
                    .model_resources_dir()
                    .join(location.folder_name)
                    .join(location.file_code)
                    .join(&resource.filename),
            )
        }
        ResourceKey::Tag(tag) => {
            let (seg1, seg2) = locate_resource_tag(tag)?;
            Some(
                library
                    .image_proxies_dir()
                    .join(seg1)
                    .join(seg2)
                    .join(tag)
                    .join(&resource.filename),
            )
        }
    }
}

/// Locate a companion movie on disk.
///
/// The catalog records which resource folder holds the movie but not its
/// exact file name, so the folder is searched for movie files. Exactly one
/// candidate is required: none means the library is missing the file,
/// several means the match would be a guess, and both count as failure.
fn companion_movie_path(library: &Library, resource: &ModelResource) -> Option<PathBuf> {
    let ResourceKey::ModelId(id) = &resource.key else {
        return None;
    };
    let id = u64::try_from(*id).ok()?;
    let location = locate_model_id(id);
    let dir = library
        .model_resources_dir()
        .join(location.folder_name)
        .join(location.file_code);

    let candidates = movie_candidates(&dir);
    match candidates.len() {
        1 => candidates.into_iter().next(),
        0 => {
            debug!("No companion movie found under {}", dir.display());
            None
        }
        n => {
            debug!(
                "{} companion movie candidates under {}, refusing to guess",
                n,
                dir.display()
            );
            None
        }
    }
}

/// Movie files directly inside a resource directory, sorted for determinism.
fn movie_candidates(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(COMPANION_EXTENSION))
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdb::{TestLibrary, VersionSpec};

    #[test]
    fn test_unadjusted_asset_resolves_to_master() {
        let lib = TestLibrary::modern();
        lib.add_album(1, "Holidays");
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG"));
        lib.link(1, 100);
        let library = lib.open();

        let asset = library.catalog().get_asset(100).unwrap().unwrap();
        let resolution = resolve_master(&library, &asset, false);
        assert!(matches!(resolution, MasterResolution::Master(_)));
        let source = resolution.into_source();
        assert_eq!(
            source.path,
            library.root().join("Masters/2020/IMG_01.JPG")
        );
        assert_eq!(source.destination_name, "IMG_01.JPG");
    }

    #[test]
    fn test_edited_asset_resolves_to_rendition() {
        let lib = TestLibrary::modern();
        lib.add_album(1, "Holidays");
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG").adjustment("adj-1"));
        lib.link(1, 100);
        lib.add_edited_resource(4096, "adj-1", "fullsizeoutput_1000.jpeg");
        lib.write_model_resource_file(4096, "fullsizeoutput_1000.jpeg");
        let library = lib.open();

        let asset = library.catalog().get_asset(100).unwrap().unwrap();
        let resolution = resolve_master(&library, &asset, false);
        assert!(matches!(resolution, MasterResolution::Edited(_)));
        let source = resolution.into_source();
        // Model id 4096 buckets into folder "10", file code "1000".
        assert_eq!(
            source.path,
            library
                .root()
                .join("resources/modelresources/10/1000/fullsizeoutput_1000.jpeg")
        );
        assert_eq!(source.destination_name, "IMG_01.JPG");
    }

    #[test]
    fn test_masters_only_skips_rendition_lookup() {
        let lib = TestLibrary::modern();
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG").adjustment("adj-1"));
        lib.add_edited_resource(4096, "adj-1", "fullsizeoutput_1000.jpeg");
        lib.write_model_resource_file(4096, "fullsizeoutput_1000.jpeg");
        let library = lib.open();

        let asset = library.catalog().get_asset(100).unwrap().unwrap();
        let resolution = resolve_master(&library, &asset, true);
        assert!(matches!(resolution, MasterResolution::Master(_)));
        assert_eq!(
            resolution.into_source().path,
            library.root().join("Masters/2020/IMG_01.JPG")
        );
    }

    #[test]
    fn test_missing_rendition_row_falls_back_to_master() {
        let lib = TestLibrary::modern();
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG").adjustment("adj-unknown"));
        let library = lib.open();

        let asset = library.catalog().get_asset(100).unwrap().unwrap();
        let resolution = resolve_master(&library, &asset, false);
        assert!(resolution.is_fallback());
        assert_eq!(
            resolution.into_source().path,
            library.root().join("Masters/2020/IMG_01.JPG")
        );
    }

    #[test]
    fn test_rendition_missing_on_disk_falls_back_to_master() {
        let lib = TestLibrary::modern();
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG").adjustment("adj-1"));
        // Row exists, file does not.
        lib.add_edited_resource(4096, "adj-1", "fullsizeoutput_1000.jpeg");
        let library = lib.open();

        let asset = library.catalog().get_asset(100).unwrap().unwrap();
        let resolution = resolve_master(&library, &asset, false);
        assert!(resolution.is_fallback());
    }

    #[test]
    fn test_legacy_rendition_uses_char_code_segments() {
        let lib = TestLibrary::legacy();
        lib.add_master(10, "m-1", "2012/IMG_1.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_1.JPG").adjustment("adj-9"));
        lib.add_proxy_resource("adj-9", "Qx7abcdef", "IMG_1_edited.JPG");
        lib.write_proxy_file("Qx7abcdef", "IMG_1_edited.JPG");
        let library = lib.open();

        let asset = library.catalog().get_asset(100).unwrap().unwrap();
        let resolution = resolve_master(&library, &asset, false);
        assert!(matches!(resolution, MasterResolution::Edited(_)));
        // 'Q' = 81, 'x' = 120.
        assert_eq!(
            resolution.into_source().path,
            library
                .root()
                .join("ImageProxies/Apple/Resource/81/120/Qx7abcdef/IMG_1_edited.JPG")
        );
    }

    #[test]
    fn test_companion_found_for_live_photo() {
        let lib = TestLibrary::modern();
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG").special_type(5));
        lib.add_companion_resource(4097, 10);
        lib.write_model_resource_file(4097, "jpegvideocomplement_1001.mov");
        let library = lib.open();

        let asset = library.catalog().get_asset(100).unwrap().unwrap();
        match resolve_companion(&library, &asset, "IMG_01.JPG") {
            CompanionResolution::Found(source) => {
                assert_eq!(source.destination_name, "IMG_01.JPG.mov");
                assert_eq!(
                    source.path,
                    library
                        .root()
                        .join("resources/modelresources/10/1001/jpegvideocomplement_1001.mov")
                );
            }
            other => panic!("expected companion, got {:?}", other),
        }
    }

    #[test]
    fn test_companion_not_applicable_for_plain_photo() {
        let lib = TestLibrary::modern();
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG"));
        let library = lib.open();

        let asset = library.catalog().get_asset(100).unwrap().unwrap();
        assert!(matches!(
            resolve_companion(&library, &asset, "IMG_01.JPG"),
            CompanionResolution::NotApplicable
        ));
    }

    #[test]
    fn test_companion_missing_row_fails_softly() {
        let lib = TestLibrary::modern();
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG").special_type(8));
        let library = lib.open();

        let asset = library.catalog().get_asset(100).unwrap().unwrap();
        assert!(matches!(
            resolve_companion(&library, &asset, "IMG_01.JPG"),
            CompanionResolution::Failed
        ));
    }

    #[test]
    fn test_ambiguous_companion_directory_fails() {
        let lib = TestLibrary::modern();
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG").special_type(5));
        lib.add_companion_resource(4097, 10);
        lib.write_model_resource_file(4097, "jpegvideocomplement_1001.mov");
        lib.write_model_resource_file(4097, "stray_copy.MOV");
        let library = lib.open();

        let asset = library.catalog().get_asset(100).unwrap().unwrap();
        assert!(matches!(
            resolve_companion(&library, &asset, "IMG_01.JPG"),
            CompanionResolution::Failed
        ));
    }

    #[test]
    fn test_empty_companion_directory_fails() {
        let lib = TestLibrary::modern();
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG").special_type(5));
        // Resource row exists but no movie was ever written.
        lib.add_companion_resource(4097, 10);
        let library = lib.open();

        let asset = library.catalog().get_asset(100).unwrap().unwrap();
        assert!(matches!(
            resolve_companion(&library, &asset, "IMG_01.JPG"),
            CompanionResolution::Failed
        ));
    }
}
