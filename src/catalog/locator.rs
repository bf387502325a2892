//! Resource location heuristics
//!
//! The catalog does not store full paths for edited renditions or companion
//! movies; it stores an identifier from which the on-disk folder and file
//! code are derived. The two library generations use two unrelated
//! derivations, so both are kept as separate strategies and selected by the
//! kind of identifier a resource row carries.

/// Folder and file-code fragment for a resource stored under the unified
/// (single-database) layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    /// Lowercase hexadecimal rendering of the model id, no padding.
    pub file_code: String,
    /// Two-character bucket folder keyed by the most significant byte.
    pub folder_name: String,
}

/// Derive the folder/file-code pair for a numeric model id.
///
/// The file code is the model id in lowercase hex, exactly as rendered. The
/// folder name is taken from a second form of the same string, left-padded
/// with `0` to at least four characters: its first two characters. This
/// buckets resources into at most 256 folders.
///
/// Every non-negative id has a location; there is no failure case.
pub fn locate_model_id(model_id: u64) -> ResourceLocation {
    let file_code = format!("{:x}", model_id);
    let padded = format!("{:0>4}", file_code);
    ResourceLocation {
        folder_name: padded[..2].to_string(),
        file_code,
    }
}

/// Derive the two path segments for an opaque resource identifier string
/// under the pre-unified layout.
///
/// The segments are the decimal character codes of the identifier's first
/// two characters, used as two separate directories (not joined into one
/// folder name). Identifiers shorter than two characters have no location.
pub fn locate_resource_tag(tag: &str) -> Option<(String, String)> {
    let mut chars = tag.chars();
    let first = chars.next()?;
    let second = chars.next()?;
    Some(((first as u32).to_string(), (second as u32).to_string()))
}
