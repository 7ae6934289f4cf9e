//! Typed views over materialized records
//!
//! Each upstream table stores its values positionally. The offsets live here
//! and nowhere else; everything downstream reads per-difficulty values through
//! `PerDifficulty`.

use txdb_common::{Error, Result};

use crate::bitfield::EditionFlags;
use crate::materialize::NormalizedRecord;
use crate::types::{BpmRange, Difficulty, PerDifficulty, Token};

const TITLE_MIN_FIELDS: usize = 6;
const TITLE_FIELD_VERSION: usize = 0;
const TITLE_FIELD_GENRE: usize = 3;
const TITLE_FIELD_ARTIST: usize = 4;
const TITLE_FIELD_FIRST_FRAGMENT: usize = 5;

const LEVEL_FIELD_FLAG: usize = 0;
/// Highest level offset is `DpLeggendaria.ordinal() * 2 + 1`
const LEVEL_MIN_FIELDS: usize = 22;

const NOTE_FIELD_BPM: usize = 11;
const NOTE_MIN_FIELDS: usize = 12;

/// Row of the title table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRecord {
    pub key: String,
    pub version_id: i64,
    pub genre: String,
    pub artist: String,
    /// Trailing fragments joined with a single space
    pub title: String,
}

impl TitleRecord {
    pub fn from_record(table: &str, record: &NormalizedRecord) -> Result<Self> {
        let fields = &record.fields;
        if fields.len() < TITLE_MIN_FIELDS {
            return Err(shape_error(table, record, "title row has too few fields"));
        }

        let version_id = fields[TITLE_FIELD_VERSION]
            .as_int()
            .ok_or_else(|| shape_error(table, record, "version id is not an integer"))?;

        let title = fields[TITLE_FIELD_FIRST_FRAGMENT..]
            .iter()
            .map(Token::to_display)
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self {
            key: record.key.clone(),
            version_id,
            genre: fields[TITLE_FIELD_GENRE].to_display(),
            artist: fields[TITLE_FIELD_ARTIST].to_display(),
            title,
        })
    }
}

/// Row of the level/bitfield table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRecord {
    pub key: String,
    pub editions: EditionFlags,
    /// 0 when the chart does not exist
    pub levels: PerDifficulty<u32>,
}

impl LevelRecord {
    pub fn from_record(table: &str, record: &NormalizedRecord) -> Result<Self> {
        let fields = &record.fields;
        if fields.len() < LEVEL_MIN_FIELDS {
            return Err(shape_error(table, record, "level row has too few fields"));
        }

        let flag = fields[LEVEL_FIELD_FLAG]
            .as_int()
            .ok_or_else(|| shape_error(table, record, "edition flag is not an integer"))?;

        let levels = PerDifficulty::try_from_fn(|difficulty| {
            let offset = difficulty.ordinal() as usize * 2 + 1;
            non_negative(table, record, &fields[offset], difficulty)
        })?;

        Ok(Self {
            key: record.key.clone(),
            editions: EditionFlags::decode(flag),
            levels,
        })
    }
}

/// Row of the note-count/tempo table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteBpmRecord {
    pub key: String,
    /// 0 when the chart does not exist
    pub notes: PerDifficulty<u32>,
    /// Tempo shared by every chart of the key unless a rule overrides it
    pub bpm: BpmRange,
}

impl NoteBpmRecord {
    pub fn from_record(table: &str, record: &NormalizedRecord) -> Result<Self> {
        let fields = &record.fields;
        if fields.len() < NOTE_MIN_FIELDS {
            return Err(shape_error(table, record, "note row has too few fields"));
        }

        let notes = PerDifficulty::try_from_fn(|difficulty| {
            non_negative(table, record, &fields[difficulty.ordinal() as usize], difficulty)
        })?;

        let bpm_text = fields[NOTE_FIELD_BPM].to_display();
        let bpm = BpmRange::parse(&bpm_text).ok_or_else(|| {
            shape_error(table, record, &format!("unreadable tempo {:?}", bpm_text))
        })?;

        Ok(Self {
            key: record.key.clone(),
            notes,
            bpm,
        })
    }
}

/// Ordered version display names.
///
/// The sentinel edition is appended last by the normalizer, so both the
/// sentinel id and `-1` resolve to the final slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionList {
    names: Vec<String>,
    sentinel_version_id: i64,
}

impl VersionList {
    pub fn from_tokens(tokens: &[Token], sentinel_version_id: i64) -> Self {
        let names: Vec<String> = tokens.iter().map(Token::to_display).collect();
        if names.len() as i64 != sentinel_version_id + 1 {
            tracing::warn!(
                versions = names.len(),
                sentinel_version_id,
                "Version list length does not place the sentinel edition last"
            );
        }
        Self {
            names,
            sentinel_version_id,
        }
    }

    /// Map the sentinel id to `-1`; other ids pass through
    pub fn remap(&self, version_id: i64) -> i64 {
        if version_id == self.sentinel_version_id {
            -1
        } else {
            version_id
        }
    }

    pub fn name(&self, version_id: i64) -> Option<&str> {
        let name = match self.remap(version_id) {
            -1 => self.names.last(),
            id if id >= 0 => self.names.get(id as usize),
            _ => None,
        };
        name.map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn sentinel_version_id(&self) -> i64 {
        self.sentinel_version_id
    }
}

fn non_negative(
    table: &str,
    record: &NormalizedRecord,
    token: &Token,
    difficulty: Difficulty,
) -> Result<u32> {
    token
        .as_int()
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| {
            shape_error(
                table,
                record,
                &format!("{} value {:?} is not a non-negative integer", difficulty, token),
            )
        })
}

fn shape_error(table: &str, record: &NormalizedRecord, reason: &str) -> Error {
    Error::InvalidLiteral {
        table: table.to_string(),
        line: record.key.clone(),
        reason: reason.to_string(),
    }
}
