//! Test Database Module
//!
//! Builds throwaway photo libraries on disk for testing the full export
//! pipeline without a real library bundle. A [`TestLibrary`] owns a
//! temporary directory, creates the schema-appropriate catalog database(s)
//! inside it, and writes master/rendition/companion files with small
//! deterministic contents.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use photo_export_tool::testdb::{TestLibrary, VersionSpec};
//!
//! let lib = TestLibrary::modern();
//! lib.add_album(1, "Holidays");
//! lib.add_master(10, "m-1", "2020/IMG_01.JPG");
//! lib.add_version(VersionSpec::new(100, "m-1", "IMG_01.JPG"));
//! lib.link(1, 100);
//!
//! let library = lib.open();
//! assert_eq!(library.catalog().list_albums(None).unwrap().len(), 1);
//! ```
//!
//! Both layouts are supported: [`TestLibrary::modern`] creates
//! `database/photos.db`, [`TestLibrary::legacy`] creates
//! `Database/Library.apdb` plus `Database/ImageProxies.apdb`.

pub mod builder;
pub mod generator;

pub use builder::{TestLibrary, VersionSpec};
pub use generator::MockContent;

/// Schema for the modern single-file catalog fixture.
pub fn modern_schema() -> &'static str {
    "CREATE TABLE RKAlbum (
         modelId INTEGER PRIMARY KEY,
         name TEXT,
         albumSubclass INTEGER
     );
     CREATE TABLE RKAlbumVersion (
         albumId INTEGER,
         versionId INTEGER
     );
     CREATE TABLE RKMaster (
         modelId INTEGER PRIMARY KEY,
         uuid TEXT UNIQUE,
         imagePath TEXT,
         isMissing INTEGER DEFAULT 0,
         isInTrash INTEGER DEFAULT 0
     );
     CREATE TABLE RKVersion (
         modelId INTEGER PRIMARY KEY,
         masterUuid TEXT,
         fileName TEXT,
         adjustmentUuid TEXT,
         specialType INTEGER,
         isMissing INTEGER DEFAULT 0,
         isInTrash INTEGER DEFAULT 0,
         showInLibrary INTEGER DEFAULT 1
     );
     CREATE TABLE RKModelResource (
         modelId INTEGER PRIMARY KEY,
         resourceTag TEXT,
         UTI TEXT,
         filename TEXT,
         attachedModelId INTEGER
     );"
}

/// Schema for the legacy main catalog fixture. Note the absence of any
/// validity columns: the two-file layout exports every album member.
pub fn legacy_schema() -> &'static str {
    "CREATE TABLE RKAlbum (
         modelId INTEGER PRIMARY KEY,
         name TEXT,
         albumSubclass INTEGER
     );
     CREATE TABLE RKAlbumVersion (
         albumId INTEGER,
         versionId INTEGER
     );
     CREATE TABLE RKMaster (
         modelId INTEGER PRIMARY KEY,
         uuid TEXT UNIQUE,
         imagePath TEXT
     );
     CREATE TABLE RKVersion (
         modelId INTEGER PRIMARY KEY,
         masterUuid TEXT,
         fileName TEXT,
         adjustmentUuid TEXT
     );"
}

/// Schema for the legacy edited-proxy store fixture.
pub fn legacy_proxies_schema() -> &'static str {
    "CREATE TABLE RKModelResource (
         resourceTag TEXT,
         resourceUuid TEXT,
         filename TEXT
     );"
}
