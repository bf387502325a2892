//! Command handler implementations
//!
//! This module contains the implementation of all CLI commands.

use crate::catalog::Library;
use crate::cli::progress::{
    format_bytes, format_duration, print_error, print_header, print_info, print_success,
    print_warning, PlanProgress,
};
use crate::cli::{Args, Commands};
use crate::core::config::{get_config_path, init_config, open_config_in_editor, Config};
use crate::core::exporter::{self, ExportOptions, ExportStats};
use crate::core::planner::{self, ExportPlan, PlanOptions};
use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

/// Run the appropriate command based on CLI arguments
pub fn run_command(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    match &args.command {
        None | Some(Commands::Export) => cmd_export(args, config, shutdown_flag),
        Some(Commands::ListAlbums) => cmd_list_albums(config),
        Some(Commands::ShowConfig) => cmd_show_config(config),
        Some(Commands::Config { path, reset }) => cmd_config(*path, *reset),
        Some(Commands::GenerateConfig { output }) => cmd_generate_config(output.as_deref()),
    }
}

/// JSON run report written with --report
#[derive(Debug, Serialize)]
struct ExportReport {
    finished_at: String,
    library_root: PathBuf,
    schema_generation: String,
    albums: usize,
    assets: usize,
    edited_fallbacks: usize,
    companion_failures: usize,
    files_copied: usize,
    companions_copied: usize,
    files_skipped: usize,
    failures: usize,
    total_bytes: u64,
    interrupted: bool,
}

/// Export albums from the library to the destination directory
fn cmd_export(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    let library_root = require_library_root(config)?;

    let destination = config.output.directory.clone();
    if !args.dry_run && destination.as_os_str().is_empty() {
        bail!(
            "No destination directory specified. Use --output or set output.directory in the config file."
        );
    }

    print_header("Photo Library Export");

    let started = Instant::now();
    let library = Library::open(&library_root)
        .with_context(|| format!("Failed to open library at {}", library_root.display()))?;
    print_info(&format!("Library:     {}", library.root().display()));
    print_info(&format!("Layout:      {}", library.generation()));
    if !args.dry_run {
        print_info(&format!("Destination: {}", destination.display()));
    }
    println!();

    let plan_options = PlanOptions {
        album_prefix: config.export.album_prefix_filter().map(str::to_string),
        masters_only: config.export.masters_only,
    };

    // Counting pass: sizes the progress display and is reported to the user
    // before any copying starts.
    let counting = PlanProgress::new();
    let albums = library
        .catalog()
        .list_albums(plan_options.album_prefix.as_deref())?;
    for album in &albums {
        let assets = planner::count_album_assets(library.catalog(), album.id)?;
        counting.album_visited(assets);
    }
    counting.finish();
    let (_, counted_assets) = counting.counts();

    if counted_assets == 0 {
        print_warning("No exportable assets found");
        return Ok(());
    }

    let plan = planner::build_plan(&library, &plan_options, &shutdown_flag)?;
    info!(
        "Planned {} assets across {} albums",
        plan.stats.assets, plan.stats.albums
    );
    if plan.stats.edited_fallbacks > 0 {
        warn!(
            "{} edited renditions could not be located; masters exported instead",
            plan.stats.edited_fallbacks
        );
    }
    if plan.stats.companion_failures > 0 {
        warn!(
            "{} live photos export without their companion movie",
            plan.stats.companion_failures
        );
    }

    if args.dry_run {
        print_plan(&plan);
        return Ok(());
    }

    let export_options = ExportOptions {
        destination,
        link_action: config.output.link_action,
        skip_existing: config.output.skip_existing,
        verify_contents: config.output.verify_contents,
        show_progress: true,
    };
    let stats = exporter::export_plan(&plan, &export_options, shutdown_flag)?;

    println!();
    if stats.interrupted {
        print_warning("Export interrupted");
    }
    print_success(&format!("{}", stats));
    print_info(&format!(
        "{} in {}",
        format_bytes(stats.total_bytes),
        format_duration(started.elapsed())
    ));
    if stats.failures > 0 {
        print_error(&format!(
            "{} entries failed; re-run to retry them",
            stats.failures
        ));
    }

    if let Some(report_path) = &args.report {
        write_report(report_path, &library, &plan, &stats)?;
        print_info(&format!("Report written to {}", report_path.display()));
    }

    Ok(())
}

/// Print a dry-run plan without touching the destination
fn print_plan(plan: &ExportPlan) {
    let mut current_album = "";
    for entry in &plan.entries {
        if entry.album_name != current_album {
            current_album = &entry.album_name;
            println!("Album: {}", current_album);
        }
        println!(
            "  {} -> {}",
            entry.primary.path.display(),
            entry.primary.destination_name
        );
        if let Some(companion) = &entry.companion {
            println!(
                "  {} -> {}",
                companion.path.display(),
                companion.destination_name
            );
        }
    }
    println!();
    print_info(&format!(
        "{} assets in {} albums (dry run, nothing copied)",
        plan.stats.assets, plan.stats.albums
    ));
}

/// Write the JSON run report
fn write_report(
    path: &Path,
    library: &Library,
    plan: &ExportPlan,
    stats: &ExportStats,
) -> Result<()> {
    let report = ExportReport {
        finished_at: chrono::Utc::now().to_rfc3339(),
        library_root: library.root().to_path_buf(),
        schema_generation: library.generation().to_string(),
        albums: plan.stats.albums,
        assets: plan.stats.assets,
        edited_fallbacks: plan.stats.edited_fallbacks,
        companion_failures: plan.stats.companion_failures,
        files_copied: stats.files_copied,
        companions_copied: stats.companions_copied,
        files_skipped: stats.files_skipped,
        failures: stats.failures,
        total_bytes: stats.total_bytes,
        interrupted: stats.interrupted,
    };
    let content = serde_json::to_string_pretty(&report)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

/// List exportable albums and their asset counts
fn cmd_list_albums(config: &Config) -> Result<()> {
    let library_root = require_library_root(config)?;
    let library = Library::open(&library_root)
        .with_context(|| format!("Failed to open library at {}", library_root.display()))?;

    print_header("Albums");
    print_info(&format!("Library: {}", library.root().display()));
    print_info(&format!("Layout:  {}", library.generation()));
    println!();

    let prefix = config.export.album_prefix_filter();
    let albums = library.catalog().list_albums(prefix)?;
    if albums.is_empty() {
        print_warning("No exportable albums found");
        return Ok(());
    }

    let mut total = 0;
    for album in &albums {
        let assets = planner::count_album_assets(library.catalog(), album.id)?;
        total += assets;
        println!("  {:<40} {:>6} assets", album.name, assets);
    }
    println!();
    print_success(&format!("{} albums, {} assets", albums.len(), total));
    Ok(())
}

/// Show current configuration
fn cmd_show_config(config: &Config) -> Result<()> {
    print_header("Configuration");
    print_info(&format!(
        "Active config file: {}",
        Config::get_active_config_path().display()
    ));
    println!();
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Open, print or reset the configuration file
fn cmd_config(path_only: bool, reset: bool) -> Result<()> {
    if reset {
        let config_path = get_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine configuration directory"))?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, Config::generate_default_config())?;
        print_success(&format!("Config reset to defaults: {}", config_path.display()));
        return Ok(());
    }

    if path_only {
        let config_path = init_config()?;
        println!("{}", config_path.display());
        return Ok(());
    }

    let config_path = open_config_in_editor()?;
    print_success(&format!("Opened config file: {}", config_path.display()));
    Ok(())
}

/// Generate a configuration file at a specific location
fn cmd_generate_config(output: Option<&Path>) -> Result<()> {
    let target = match output {
        Some(path) => path.to_path_buf(),
        None => init_config()?,
    };
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&target, Config::generate_default_config())?;
    print_success(&format!("Config file written to {}", target.display()));
    Ok(())
}

/// The library root from config, or an actionable error.
fn require_library_root(config: &Config) -> Result<PathBuf> {
    let root = config.library.root.clone();
    if root.as_os_str().is_empty() {
        bail!("No library specified. Use --library or set library.root in the config file.");
    }
    if !root.is_dir() {
        bail!("Library path is not a directory: {}", root.display());
    }
    Ok(root)
}
