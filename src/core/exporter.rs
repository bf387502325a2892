//! Export engine
//!
//! Consumes an export plan against a destination directory. This module owns
//! all destination I/O: album directory creation, existence checks, optional
//! byte-for-byte verification, and the copy/symlink/hardlink decision.
//! Failures here are per-entry: a missing source or a failed write is
//! counted and logged, never allowed to abort the remaining entries.

use crate::core::config::LinkAction;
use crate::core::error::{ExportError, Result};
use crate::core::planner::ExportPlan;
use crate::core::resolver::ExportSource;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Buffer size for streaming content comparison (64KB)
const COMPARE_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for the export pass
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Destination directory; one subdirectory per album
    pub destination: PathBuf,
    /// How files are placed into the destination
    pub link_action: LinkAction,
    /// Skip destination files that already exist with matching size
    pub skip_existing: bool,
    /// Byte-compare existing files instead of trusting size alone
    pub verify_contents: bool,
    /// Show a progress bar
    pub show_progress: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("./exported_albums"),
            link_action: LinkAction::Copy,
            skip_existing: true,
            verify_contents: false,
            show_progress: true,
        }
    }
}

/// Statistics about the export pass
#[derive(Debug, Default)]
pub struct ExportStats {
    pub files_copied: usize,
    pub companions_copied: usize,
    pub files_skipped: usize,
    pub failures: usize,
    pub total_bytes: u64,
    pub interrupted: bool,
}

/// Result of placing a single file
enum PlaceResult {
    /// File was placed, with the number of source bytes
    Placed(u64),
    /// Destination already holds this file
    Skipped,
}

/// Execute an export plan.
///
/// Album directories are created idempotently, once per album. The shutdown
/// flag is checked between entries; on shutdown the stats so far are
/// returned with `interrupted` set.
pub fn export_plan(
    plan: &ExportPlan,
    options: &ExportOptions,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<ExportStats> {
    let mut stats = ExportStats::default();

    fs::create_dir_all(&options.destination).map_err(|e| ExportError::Destination {
        path: options.destination.clone(),
        message: e.to_string(),
    })?;

    let progress = if options.show_progress {
        let bar = ProgressBar::new(plan.entries.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .expect("Invalid progress template")
                .progress_chars("#>-"),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut created_dirs: HashSet<PathBuf> = HashSet::new();

    for (index, entry) in plan.entries.iter().enumerate() {
        if shutdown_flag.load(Ordering::SeqCst) {
            warn!("Shutdown requested, stopping export...");
            progress.finish_with_message("Export interrupted!");
            stats.interrupted = true;
            return Ok(stats);
        }

        progress.set_position(index as u64);
        let display_name: String = entry.primary.destination_name.chars().take(30).collect();
        progress.set_message(display_name);

        let album_dir = options.destination.join(&entry.album_name);
        if created_dirs.insert(album_dir.clone()) {
            if let Err(e) = fs::create_dir_all(&album_dir) {
                warn!(
                    "Failed to create album directory '{}': {}",
                    album_dir.display(),
                    e
                );
                stats.failures += 1;
                continue;
            }
        }

        match place_file(&entry.primary, &album_dir, options) {
            Ok(PlaceResult::Placed(bytes)) => {
                stats.files_copied += 1;
                stats.total_bytes += bytes;
            }
            Ok(PlaceResult::Skipped) => stats.files_skipped += 1,
            Err(e) => {
                debug!(
                    "Failed to export '{}': {}",
                    entry.primary.destination_name, e
                );
                stats.failures += 1;
            }
        }

        if let Some(companion) = &entry.companion {
            match place_file(companion, &album_dir, options) {
                Ok(PlaceResult::Placed(bytes)) => {
                    stats.companions_copied += 1;
                    stats.total_bytes += bytes;
                }
                Ok(PlaceResult::Skipped) => stats.files_skipped += 1,
                Err(e) => {
                    debug!(
                        "Failed to export companion '{}': {}",
                        companion.destination_name, e
                    );
                    stats.failures += 1;
                }
            }
        }
    }

    progress.finish_with_message("Export complete!");
    Ok(stats)
}

/// Place one source file into an album directory.
fn place_file(
    source: &ExportSource,
    album_dir: &Path,
    options: &ExportOptions,
) -> Result<PlaceResult> {
    let target = album_dir.join(&source.destination_name);

    let source_meta = fs::metadata(&source.path).map_err(|e| {
        ExportError::IoError(format!(
            "Source '{}' unavailable: {}",
            source.path.display(),
            e
        ))
    })?;

    if options.skip_existing {
        if let Ok(target_meta) = fs::metadata(&target) {
            if target_meta.len() == source_meta.len()
                && (!options.verify_contents || files_identical(&source.path, &target)?)
            {
                debug!("Skipping existing file: {}", target.display());
                return Ok(PlaceResult::Skipped);
            }
        }
    }

    // A stale or different file is replaced, not appended to; links in
    // particular fail on an existing target.
    if target.symlink_metadata().is_ok() {
        fs::remove_file(&target).map_err(|e| ExportError::Destination {
            path: target.clone(),
            message: e.to_string(),
        })?;
    }

    match options.link_action {
        LinkAction::Copy => {
            fs::copy(&source.path, &target).map_err(|e| ExportError::Destination {
                path: target.clone(),
                message: e.to_string(),
            })?;
        }
        LinkAction::Hardlink => {
            fs::hard_link(&source.path, &target).map_err(|e| ExportError::Destination {
                path: target.clone(),
                message: e.to_string(),
            })?;
        }
        LinkAction::Symlink => {
            make_symlink(&source.path, &target)?;
        }
    }

    debug!(
        "Placed: {} ({} bytes)",
        target.display(),
        source_meta.len()
    );
    Ok(PlaceResult::Placed(source_meta.len()))
}

#[cfg(unix)]
fn make_symlink(source: &Path, target: &Path) -> Result<()> {
    std::os::unix::fs::symlink(source, target).map_err(|e| ExportError::Destination {
        path: target.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(not(unix))]
fn make_symlink(_source: &Path, target: &Path) -> Result<()> {
    Err(ExportError::Destination {
        path: target.to_path_buf(),
        message: "symlink placement is only supported on Unix".to_string(),
    })
}

/// Compare two files by streaming SHA-256 digests.
fn files_identical(a: &Path, b: &Path) -> Result<bool> {
    Ok(file_digest(a)? == file_digest(b)?)
}

/// Streaming SHA-256 digest of one file.
fn file_digest(path: &Path) -> Result<[u8; 32]> {
    let file = File::open(path)
        .map_err(|e| ExportError::IoError(format!("Failed to open '{}': {}", path.display(), e)))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; COMPARE_BUFFER_SIZE];

    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|e| ExportError::IoError(format!("Failed to read '{}': {}", path.display(), e)))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize().into())
}

impl std::fmt::Display for ExportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size_mb = self.total_bytes as f64 / 1_048_576.0;
        write!(
            f,
            "Copied: {}, Companions: {}, Skipped: {}, Failures: {}, Total size: {:.2} MB",
            self.files_copied, self.companions_copied, self.files_skipped, self.failures, size_mb
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Library;
    use crate::core::planner::{build_plan, count_assets, PlanOptions};
    use crate::testdb::{TestLibrary, VersionSpec};

    fn no_shutdown() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    fn quiet_options(destination: &Path) -> ExportOptions {
        ExportOptions {
            destination: destination.to_path_buf(),
            show_progress: false,
            ..Default::default()
        }
    }

    fn small_library() -> (TestLibrary, Library) {
        let lib = TestLibrary::modern();
        lib.add_album(1, "Holidays");
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG"));
        lib.link(1, 100);
        lib.add_master(11, "m-2", "2020/IMG_02.JPG");
        lib.add_version(VersionSpec::new(101, "m-2", "IMG_02.JPG"));
        lib.link(1, 101);
        let library = lib.open();
        (lib, library)
    }

    #[test]
    fn test_export_copies_plan_entries() {
        let (_lib, library) = small_library();
        let dest = tempfile::tempdir().unwrap();

        let plan = build_plan(&library, &PlanOptions::default(), &no_shutdown()).unwrap();
        let stats =
            export_plan(&plan, &quiet_options(dest.path()), no_shutdown()).unwrap();

        assert_eq!(stats.files_copied, 2);
        assert_eq!(stats.failures, 0);
        assert!(dest.path().join("Holidays/IMG_01.JPG").is_file());
        assert!(dest.path().join("Holidays/IMG_02.JPG").is_file());
    }

    #[test]
    fn test_second_export_is_idempotent() {
        let (_lib, library) = small_library();
        let dest = tempfile::tempdir().unwrap();
        let options = quiet_options(dest.path());

        let plan = build_plan(&library, &PlanOptions::default(), &no_shutdown()).unwrap();
        let first = export_plan(&plan, &options, no_shutdown()).unwrap();
        assert_eq!(first.files_copied, 2);

        let second = export_plan(&plan, &options, no_shutdown()).unwrap();
        assert_eq!(second.files_copied, 0);
        assert_eq!(second.files_skipped, 2);
        assert_eq!(second.failures, 0);
    }

    #[test]
    fn test_verify_contents_replaces_corrupted_destination() {
        let (_lib, library) = small_library();
        let dest = tempfile::tempdir().unwrap();
        let mut options = quiet_options(dest.path());

        let plan = build_plan(&library, &PlanOptions::default(), &no_shutdown()).unwrap();
        export_plan(&plan, &options, no_shutdown()).unwrap();

        // Corrupt one destination file without changing its size.
        let target = dest.path().join("Holidays/IMG_01.JPG");
        let mut content = fs::read(&target).unwrap();
        content[0] ^= 0xFF;
        fs::write(&target, &content).unwrap();

        // Size-only checking is fooled...
        let skipped = export_plan(&plan, &options, no_shutdown()).unwrap();
        assert_eq!(skipped.files_copied, 0);

        // ...content verification is not.
        options.verify_contents = true;
        let repaired = export_plan(&plan, &options, no_shutdown()).unwrap();
        assert_eq!(repaired.files_copied, 1);
        assert_eq!(repaired.files_skipped, 1);
        let source = library.root().join("Masters/2020/IMG_01.JPG");
        assert_eq!(fs::read(&target).unwrap(), fs::read(source).unwrap());
    }

    #[test]
    fn test_missing_source_fails_entry_not_run() {
        let lib = TestLibrary::modern();
        lib.add_album(1, "Album A");
        lib.add_album(2, "Album B");
        // Row exists but the master file was never written.
        lib.add_master_row(10, "m-gone", "2020/GONE.JPG");
        lib.add_version(VersionSpec::new(100, "m-gone", "GONE.JPG"));
        lib.link(1, 100);
        lib.add_master(11, "m-ok", "2020/IMG_02.JPG");
        lib.add_version(VersionSpec::new(101, "m-ok", "IMG_02.JPG"));
        lib.link(2, 101);
        let library = lib.open();
        let dest = tempfile::tempdir().unwrap();

        let plan = build_plan(&library, &PlanOptions::default(), &no_shutdown()).unwrap();
        assert_eq!(plan.entries.len(), 2);
        let stats = export_plan(&plan, &quiet_options(dest.path()), no_shutdown()).unwrap();

        // The failure in one album does not block the other.
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.files_copied, 1);
        assert!(dest.path().join("Album B/IMG_02.JPG").is_file());
    }

    #[test]
    fn test_companion_lands_next_to_photo() {
        let lib = TestLibrary::modern();
        lib.add_album(1, "Live");
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG").special_type(5));
        lib.link(1, 100);
        lib.add_companion_resource(4097, 10);
        lib.write_model_resource_file(4097, "jpegvideocomplement_1001.mov");
        let library = lib.open();
        let dest = tempfile::tempdir().unwrap();

        let plan = build_plan(&library, &PlanOptions::default(), &no_shutdown()).unwrap();
        let stats = export_plan(&plan, &quiet_options(dest.path()), no_shutdown()).unwrap();

        assert_eq!(stats.files_copied, 1);
        assert_eq!(stats.companions_copied, 1);
        assert!(dest.path().join("Live/IMG_01.JPG").is_file());
        assert!(dest.path().join("Live/IMG_01.JPG.mov").is_file());
    }

    #[test]
    fn test_shared_master_copied_into_each_album() {
        let lib = TestLibrary::modern();
        lib.add_album(1, "Album A");
        lib.add_album(2, "Album B");
        lib.add_master(10, "m-1", "2020/IMG_01.JPG");
        lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG"));
        lib.link(1, 100);
        lib.link(2, 100);
        let library = lib.open();
        let dest = tempfile::tempdir().unwrap();

        let plan = build_plan(&library, &PlanOptions::default(), &no_shutdown()).unwrap();
        let stats = export_plan(&plan, &quiet_options(dest.path()), no_shutdown()).unwrap();

        assert_eq!(stats.files_copied, 2);
        assert!(dest.path().join("Album A/IMG_01.JPG").is_file());
        assert!(dest.path().join("Album B/IMG_01.JPG").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_placement() {
        let (_lib, library) = small_library();
        let dest = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            link_action: LinkAction::Symlink,
            ..quiet_options(dest.path())
        };

        let plan = build_plan(&library, &PlanOptions::default(), &no_shutdown()).unwrap();
        let stats = export_plan(&plan, &options, no_shutdown()).unwrap();

        assert_eq!(stats.files_copied, 2);
        let target = dest.path().join("Holidays/IMG_01.JPG");
        assert!(target.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read(&target).unwrap(),
            fs::read(library.root().join("Masters/2020/IMG_01.JPG")).unwrap()
        );
    }

    #[test]
    fn test_hardlink_placement() {
        let (_lib, library) = small_library();
        let dest = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            link_action: LinkAction::Hardlink,
            ..quiet_options(dest.path())
        };

        let plan = build_plan(&library, &PlanOptions::default(), &no_shutdown()).unwrap();
        let stats = export_plan(&plan, &options, no_shutdown()).unwrap();
        assert_eq!(stats.files_copied, 2);
        assert_eq!(
            fs::read(dest.path().join("Holidays/IMG_01.JPG")).unwrap(),
            fs::read(library.root().join("Masters/2020/IMG_01.JPG")).unwrap()
        );
    }

    #[test]
    fn test_count_matches_copies_on_fresh_destination() {
        let (_lib, library) = small_library();
        let dest = tempfile::tempdir().unwrap();

        let options = PlanOptions::default();
        let counted = count_assets(library.catalog(), &options).unwrap();
        let plan = build_plan(&library, &options, &no_shutdown()).unwrap();
        let stats = export_plan(&plan, &quiet_options(dest.path()), no_shutdown()).unwrap();

        assert_eq!(counted, stats.files_copied);
    }

    #[test]
    fn test_shutdown_before_first_entry() {
        let (_lib, library) = small_library();
        let dest = tempfile::tempdir().unwrap();

        let plan = build_plan(&library, &PlanOptions::default(), &no_shutdown()).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let stats = export_plan(&plan, &quiet_options(dest.path()), flag).unwrap();

        assert!(stats.interrupted);
        assert_eq!(stats.files_copied, 0);
    }

    #[test]
    fn test_files_identical() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        let c = dir.path().join("c.bin");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"same bytes").unwrap();
        fs::write(&c, b"same bytez").unwrap();

        assert!(files_identical(&a, &b).unwrap());
        assert!(!files_identical(&a, &c).unwrap());
    }
}
