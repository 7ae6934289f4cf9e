//! Names of the four upstream source tables

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the upstream script files the catalog is scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    /// Title, artist, genre and version per catalog key
    Titles,
    /// Edition bitfield and per-difficulty levels
    Levels,
    /// Note counts and tempo, plus the tempo dispatch function
    NotesBpm,
    /// Version display names
    Versions,
}

impl TableName {
    /// All tables in build order
    pub const ALL: [TableName; 4] = [
        TableName::Titles,
        TableName::Levels,
        TableName::NotesBpm,
        TableName::Versions,
    ];

    /// Default upstream file name
    pub fn default_file_name(self) -> &'static str {
        match self {
            TableName::Titles => "titletbl.js",
            TableName::Levels => "actbl.js",
            TableName::NotesBpm => "datatbl.js",
            TableName::Versions => "scrlist.js",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_file_name())
    }
}
