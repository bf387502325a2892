//! Export plan construction
//!
//! Walks the catalog twice with the identical album/asset filter: a counting
//! pass that sizes the progress display, then a planning pass that resolves
//! every asset into concrete plan entries. Because both passes run the same
//! selector over the same staged database, the reported total always equals
//! the number of entries attempted.

use crate::catalog::{AssetDetail, Catalog, Library};
use crate::core::error::Result;
use crate::core::resolver::{
    resolve_companion, resolve_master, CompanionResolution, ExportSource,
};
use log::{info, warn};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Options controlling which assets are planned and how they resolve.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Only plan albums whose name starts with this prefix.
    pub album_prefix: Option<String>,
    /// Always use the master capture, never an edited rendition.
    pub masters_only: bool,
}

/// Aggregate counters produced by the planning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanStats {
    /// Albums planned.
    pub albums: usize,
    /// Assets planned (equals the counting pass total).
    pub assets: usize,
    /// Assets whose edited rendition was wanted but unusable.
    pub edited_fallbacks: usize,
    /// Live photos whose companion movie could not be located.
    pub companion_failures: usize,
}

/// One asset's worth of work for the copy engine: the primary file and, for
/// live photos, its companion movie.
#[derive(Debug, Clone)]
pub struct PlanEntry {
    /// Destination album directory name.
    pub album_name: String,
    /// The master or edited rendition.
    pub primary: ExportSource,
    /// The companion movie, when one resolved.
    pub companion: Option<ExportSource>,
}

/// An ordered export plan plus its counters.
#[derive(Debug)]
pub struct ExportPlan {
    pub entries: Vec<PlanEntry>,
    pub stats: PlanStats,
}

/// Counting pass: total exportable assets across all matching albums.
///
/// Runs the same selector as [`build_plan`], so the result is exactly the
/// number of entries a subsequent planning pass will emit.
pub fn count_assets(catalog: &dyn Catalog, options: &PlanOptions) -> Result<usize> {
    let mut total = 0;
    for album in catalog.list_albums(options.album_prefix.as_deref())? {
        total += exportable_assets(catalog, album.id)?.len();
    }
    Ok(total)
}

/// Per-album counting pass, for album listings.
pub fn count_album_assets(catalog: &dyn Catalog, album_id: i64) -> Result<usize> {
    Ok(exportable_assets(catalog, album_id)?.len())
}

/// Planning pass: resolve every exportable asset into a plan entry.
///
/// Albums are visited in source order, assets within an album in source
/// order. The shutdown flag is checked between assets; on shutdown the plan
/// built so far is returned.
pub fn build_plan(
    library: &Library,
    options: &PlanOptions,
    shutdown_flag: &Arc<AtomicBool>,
) -> Result<ExportPlan> {
    let catalog = library.catalog();
    let mut entries = Vec::new();
    let mut stats = PlanStats::default();

    let albums = catalog.list_albums(options.album_prefix.as_deref())?;
    stats.albums = albums.len();

    'albums: for album in &albums {
        let mut used_names: HashSet<String> = HashSet::new();

        for asset in exportable_assets(catalog, album.id)? {
            if shutdown_flag.load(Ordering::SeqCst) {
                info!("Shutdown requested, stopping plan construction");
                break 'albums;
            }

            let resolution = resolve_master(library, &asset, options.masters_only);
            if resolution.is_fallback() {
                stats.edited_fallbacks += 1;
            }
            let mut primary = resolution.into_source();
            primary.destination_name =
                unique_destination_name(&mut used_names, &primary.destination_name);

            let companion =
                match resolve_companion(library, &asset, &primary.destination_name) {
                    CompanionResolution::Found(source) => {
                        used_names.insert(source.destination_name.clone());
                        Some(source)
                    }
                    CompanionResolution::Failed => {
                        stats.companion_failures += 1;
                        None
                    }
                    CompanionResolution::NotApplicable => None,
                };

            stats.assets += 1;
            entries.push(PlanEntry {
                album_name: album.name.clone(),
                primary,
                companion,
            });
        }
    }

    Ok(ExportPlan { entries, stats })
}

/// The asset rows of an album that pass the layout's validity predicate, in
/// source order. Shared by the counting and planning passes.
fn exportable_assets(catalog: &dyn Catalog, album_id: i64) -> Result<Vec<AssetDetail>> {
    let ids = catalog.list_asset_ids(album_id)?;
    let mut assets = Vec::with_capacity(ids.len());
    for id in ids {
        match catalog.get_asset(id) {
            Ok(Some(asset)) => assets.push(asset),
            // Filtered out or the row is gone; both are normal.
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to read asset {}: {}", id, e);
            }
        }
    }
    Ok(assets)
}

/// Reserve a destination name, adding a numeric suffix on collision so names
/// stay unique within one album directory.
fn unique_destination_name(used: &mut HashSet<String>, name: &str) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let extension = Path::new(name)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let mut counter = 1;
    loop {
        let candidate = if extension.is_empty() {
            format!("{}_{}", stem, counter)
        } else {
            format!("{}_{}.{}", stem, counter, extension)
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}
