//! Test Helper Utilities
//!
//! Shared fixtures and log capture for txdb-catalog integration tests

#![allow(dead_code)]

pub mod log_capture;

pub use log_capture::LogCapture;

use txdb_catalog::RawTables;

pub const TITLES: &str = include_str!("../fixtures/titletbl.js");
pub const LEVELS: &str = include_str!("../fixtures/actbl.js");
pub const NOTES_BPM: &str = include_str!("../fixtures/datatbl.js");
pub const VERSIONS: &str = include_str!("../fixtures/scrlist.js");

/// The four sample tables as fetched
pub fn fixture_tables() -> RawTables {
    RawTables {
        titles: TITLES.to_string(),
        levels: LEVELS.to_string(),
        notes_bpm: NOTES_BPM.to_string(),
        versions: VERSIONS.to_string(),
    }
}
