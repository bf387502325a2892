//! Catalog abstraction traits
//!
//! This module defines the trait that hides the difference between the two
//! supported library generations behind one query contract, plus the row
//! types that cross it. Both real catalogs (legacy and modern) and test
//! fixtures implement the same trait, so the planner and resolvers never
//! branch on the layout themselves.
//!
//! Every lookup returns a result-or-absent value: a missing row is a normal
//! outcome the caller handles with a fallback, never an error.

use crate::core::error::Result;
use std::fmt::{self, Display};

/// Album names that are never exported, regardless of subclass.
pub const EXCLUDED_ALBUM_NAMES: &[&str] = &["printAlbum", "Last Import"];

/// Adjustment markers meaning "no edited rendition exists".
pub const UNADJUSTED_MARKERS: &[&str] = &["UNADJUSTED", "UNADJUSTEDNONRAW"];

/// Special-type values flagging a live or HDR photo that may carry a
/// companion movie. Only the modern layout records these.
pub const LIVE_SPECIAL_TYPES: &[i64] = &[5, 8];

/// Type identifier of companion movie resources.
pub const COMPANION_MOVIE_UTI: &str = "com.apple.quicktime-movie";

/// The metadata layout generation of a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaGeneration {
    /// Two-file layout: separate album/master catalog and edited-resource
    /// store.
    Legacy,
    /// Single-file unified layout.
    Modern,
}

impl SchemaGeneration {
    pub fn display_name(&self) -> &'static str {
        match self {
            SchemaGeneration::Legacy => "legacy (two-file)",
            SchemaGeneration::Modern => "modern (unified)",
        }
    }
}

impl Display for SchemaGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One exportable album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    /// Catalog row id.
    pub id: i64,
    /// User-visible album name; doubles as the destination directory name.
    pub name: String,
}

/// One asset row joined with its master, already filtered by the validity
/// predicate appropriate to the layout.
#[derive(Debug, Clone)]
pub struct AssetDetail {
    /// Catalog row id of the version.
    pub id: i64,
    /// Uuid of the referenced master.
    pub master_uuid: String,
    /// Master path relative to the fixed masters subtree.
    pub image_path: String,
    /// File name the export should carry.
    pub file_name: String,
    /// Adjustment marker; one of [`UNADJUSTED_MARKERS`] when no edit exists.
    pub adjustment_uuid: String,
    /// Live/HDR marker (modern layout only).
    pub special_type: Option<i64>,
    /// Model id of the master row, used to key companion lookups
    /// (modern layout only).
    pub master_model_id: Option<i64>,
}

impl AssetDetail {
    /// Whether the adjustment marker denotes a real edited rendition.
    pub fn has_adjustments(&self) -> bool {
        !UNADJUSTED_MARKERS.contains(&self.adjustment_uuid.as_str())
    }

    /// Whether this asset may carry a companion movie.
    pub fn is_live_photo(&self) -> bool {
        self.special_type
            .map(|t| LIVE_SPECIAL_TYPES.contains(&t))
            .unwrap_or(false)
    }
}

/// The key under which a resource file is located on disk. The key kind
/// encodes which location heuristic applies, so resolvers never consult the
/// schema generation a second time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKey {
    /// Numeric model id (unified layout): hex folder/file-code derivation.
    ModelId(i64),
    /// Opaque identifier string (pre-unified layout): character-code
    /// segment derivation.
    Tag(String),
}

/// An edited rendition or attached companion resource.
#[derive(Debug, Clone)]
pub struct ModelResource {
    /// Location key for the resource file.
    pub key: ResourceKey,
    /// File name of the resource inside its derived folder.
    pub filename: String,
}

/// Query contract over one opened library catalog.
///
/// Implementations are read-only; the same instance serves both the counting
/// pass and the export pass so the two can never observe different filters.
pub trait Catalog: Send + Sync {
    /// The layout generation this catalog was opened as.
    fn generation(&self) -> SchemaGeneration;

    /// List exportable albums in source order, applying the subclass marker,
    /// the fixed exclusion set and the optional name-prefix filter.
    fn list_albums(&self, name_prefix: Option<&str>) -> Result<Vec<Album>>;

    /// List the asset ids belonging to an album, in source order.
    fn list_asset_ids(&self, album_id: i64) -> Result<Vec<i64>>;

    /// Fetch one asset joined with its master. Returns `None` when the row
    /// is missing or fails the validity predicate for this layout.
    fn get_asset(&self, asset_id: i64) -> Result<Option<AssetDetail>>;

    /// Look up the edited rendition recorded under an adjustment tag.
    fn find_edited_resource(&self, adjustment_tag: &str) -> Result<Option<ModelResource>>;

    /// Look up the companion movie attached to a master's model id. The
    /// legacy layout has no attached resources and always reports absent.
    fn find_companion_resource(&self, attached_model_id: i64) -> Result<Option<ModelResource>>;
}

/// A boxed catalog trait object for dynamic dispatch.
pub type BoxedCatalog = Box<dyn Catalog>;

/// Prefix filter shared by both catalog implementations.
pub(crate) fn matches_prefix(name: &str, prefix: Option<&str>) -> bool {
    match prefix {
        Some(p) => name.starts_with(p),
        None => true,
    }
}

/// Build an [`Album`] from a raw catalog row, applying the exclusion set and
/// prefix filter. Rows without a name are dropped. Shared by both catalog
/// implementations so the two passes of a run can never disagree.
pub(crate) fn album_from_row(
    id: i64,
    name: Option<String>,
    prefix: Option<&str>,
) -> Option<Album> {
    let name = name?;
    if EXCLUDED_ALBUM_NAMES.contains(&name.as_str()) {
        return None;
    }
    if !matches_prefix(&name, prefix) {
        return None;
    }
    Some(Album { id, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_adjustments() {
        let mut asset = AssetDetail {
            id: 1,
            master_uuid: "u".into(),
            image_path: "2020/IMG_01.JPG".into(),
            file_name: "IMG_01.JPG".into(),
            adjustment_uuid: "UNADJUSTED".into(),
            special_type: None,
            master_model_id: None,
        };
        assert!(!asset.has_adjustments());

        asset.adjustment_uuid = "UNADJUSTEDNONRAW".into();
        assert!(!asset.has_adjustments());

        asset.adjustment_uuid = "0A1B2C3D-ADJ".into();
        assert!(asset.has_adjustments());
    }

    #[test]
    fn test_is_live_photo() {
        let mut asset = AssetDetail {
            id: 1,
            master_uuid: "u".into(),
            image_path: "p".into(),
            file_name: "f".into(),
            adjustment_uuid: "UNADJUSTED".into(),
            special_type: None,
            master_model_id: Some(7),
        };
        assert!(!asset.is_live_photo());

        for t in [5, 8] {
            asset.special_type = Some(t);
            assert!(asset.is_live_photo(), "specialType {}", t);
        }

        asset.special_type = Some(3);
        assert!(!asset.is_live_photo());
    }

    #[test]
    fn test_matches_prefix() {
        assert!(matches_prefix("Holidays 2019", None));
        assert!(matches_prefix("Holidays 2019", Some("Holi")));
        assert!(!matches_prefix("Holidays 2019", Some("Work")));
        assert!(matches_prefix("anything", Some("")));
    }
}
