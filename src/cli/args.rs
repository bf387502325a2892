//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Export albums from legacy desktop photo libraries to plain folders
#[derive(Parser, Debug)]
#[command(name = "photo_export_tool")]
#[command(version = "1.0.0")]
#[command(
    about = "Export albums from legacy desktop photo libraries (iPhoto/Photos.app style bundles) to plain folders",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the photo library bundle (overrides config)
    #[arg(short, long)]
    pub library: Option<PathBuf>,

    /// Destination directory for exported albums (overrides config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only export albums whose name starts with this prefix (overrides config)
    #[arg(long, value_name = "PREFIX")]
    pub album_prefix: Option<String>,

    /// Always export the original capture, ignoring edited renditions
    #[arg(long)]
    pub masters_only: bool,

    /// How files are placed: copy, symlink or hardlink (overrides config)
    #[arg(long, value_name = "ACTION", value_parser = ["copy", "symlink", "hardlink"])]
    pub link: Option<String>,

    /// Byte-compare existing destination files instead of trusting size alone
    #[arg(long)]
    pub verify_contents: bool,

    /// Resolve the plan and print it without copying anything
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON run report to this file after exporting
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short = 'L', long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export albums from the library to the destination directory
    ///
    /// This is the default when no subcommand is given.
    Export,

    /// List exportable albums and their asset counts
    ListAlbums,

    /// Show current configuration
    ShowConfig,

    /// Open the configuration file in your default editor
    ///
    /// If no config file exists, a default one will be created.
    Config {
        /// Show the config file path without opening it
        #[arg(long)]
        path: bool,

        /// Reset config to defaults (creates a fresh config file)
        #[arg(long)]
        reset: bool,
    },

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
