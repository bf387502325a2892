//! Mock content generator for fixture files
//!
//! Generates small file bodies with realistic headers for the fixture
//! libraries. Contents are deterministic per seed so tests can rely on
//! byte-for-byte comparisons, and sizes are kept tiny on purpose.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default content size for JPEG fixture files
pub const TEST_JPEG_SIZE: usize = 2 * 1024;

/// Default content size for QuickTime fixture files
pub const TEST_MOVIE_SIZE: usize = 4 * 1024;

/// Mock content generator
pub struct MockContent;

impl MockContent {
    /// Generate a minimal JPEG body with deterministic content
    pub fn jpeg(seed: u64) -> Vec<u8> {
        let mut data = Vec::with_capacity(TEST_JPEG_SIZE);

        // JPEG SOI marker + JFIF APP0 segment
        data.extend_from_slice(&[0xFF, 0xD8]);
        data.extend_from_slice(&[0xFF, 0xE0]);
        data.extend_from_slice(&[0x00, 0x10]);
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);

        let mut rng = StdRng::seed_from_u64(seed);
        while data.len() < TEST_JPEG_SIZE - 2 {
            data.push(rng.gen());
        }

        // JPEG EOI marker
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    /// Generate a minimal QuickTime body with deterministic content
    pub fn quicktime(seed: u64) -> Vec<u8> {
        let mut data = Vec::with_capacity(TEST_MOVIE_SIZE);

        // ftyp box advertising the qt brand
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x14]);
        data.extend_from_slice(b"ftyp");
        data.extend_from_slice(b"qt  ");
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        data.extend_from_slice(b"qt  ");

        let mut rng = StdRng::seed_from_u64(seed);
        while data.len() < TEST_MOVIE_SIZE {
            data.push(rng.gen());
        }
        data
    }
}
