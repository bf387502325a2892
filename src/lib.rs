//! Photo Export Tool Library
//!
//! A library for exporting user-visible albums from legacy desktop photo
//! libraries (iPhoto/Photos.app style bundles) to plain folders, selecting
//! either the original master capture or its edited rendition per asset and
//! discovering companion movies for live photos.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`catalog`] - Library layout probing, database staging, and the catalog
//!   query contract over both supported metadata generations
//! - [`core`] - Configuration, error handling, source resolution, plan
//!   construction and the copy engine
//! - [`cli`] - Command-line interface (only used by the binary)
//! - [`testdb`] - On-disk fixture libraries for testing without a real bundle
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use photo_export_tool::catalog::Library;
//! use photo_export_tool::core::exporter::{self, ExportOptions};
//! use photo_export_tool::core::planner::{self, PlanOptions};
//! use std::path::Path;
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Probe the layout, stage the catalog database, open it
//!     let library = Library::open(Path::new("/photos/Library.photoslibrary"))?;
//!
//!     // Count, then plan (both passes see the identical filter)
//!     let options = PlanOptions::default();
//!     let total = planner::count_assets(library.catalog(), &options)?;
//!     println!("{} assets to export", total);
//!
//!     let shutdown_flag = Arc::new(AtomicBool::new(false));
//!     let plan = planner::build_plan(&library, &options, &shutdown_flag)?;
//!
//!     // Copy the plan into the destination
//!     let stats = exporter::export_plan(
//!         &plan,
//!         &ExportOptions {
//!             destination: "/backup/albums".into(),
//!             ..Default::default()
//!         },
//!         shutdown_flag,
//!     )?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```
//!
//! # Testing Without a Library Bundle
//!
//! The `testdb` module builds throwaway bundles of either layout:
//!
//! ```rust,no_run
//! use photo_export_tool::testdb::{TestLibrary, VersionSpec};
//!
//! let lib = TestLibrary::modern();
//! lib.add_album(1, "Holidays");
//! lib.add_master(10, "m-1", "2020/IMG_01.JPG");
//! lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG"));
//! lib.link(1, 100);
//! let library = lib.open();
//! ```

// Core modules - always available
pub mod catalog;
pub mod cli;
pub mod core;
pub mod testdb;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
