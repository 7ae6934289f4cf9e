//! Domain types shared by the pipeline stages and the catalog

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::bitfield::EditionFlags;

/// Play-mode/difficulty-tier combination.
///
/// Declaration order matches the upstream ordinal order, so the derived
/// `Ord` can be used for threshold comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    SpNormal,
    SpHyper,
    SpAnother,
    SpLeggendaria,
    DpNormal,
    DpHyper,
    DpAnother,
    DpLeggendaria,
    /// Reserved; never assigned a chart
    Unknown,
}

impl Difficulty {
    /// The eight categories a chart can exist in
    pub const PLAYABLE: [Difficulty; 8] = [
        Difficulty::SpNormal,
        Difficulty::SpHyper,
        Difficulty::SpAnother,
        Difficulty::SpLeggendaria,
        Difficulty::DpNormal,
        Difficulty::DpHyper,
        Difficulty::DpAnother,
        Difficulty::DpLeggendaria,
    ];

    /// Upstream ordinal, as used by the dispatch function's `type` argument
    pub fn ordinal(self) -> u32 {
        match self {
            Difficulty::SpNormal => 2,
            Difficulty::SpHyper => 3,
            Difficulty::SpAnother => 4,
            Difficulty::SpLeggendaria => 5,
            Difficulty::DpNormal => 7,
            Difficulty::DpHyper => 8,
            Difficulty::DpAnother => 9,
            Difficulty::DpLeggendaria => 10,
            Difficulty::Unknown => 99,
        }
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Difficulty> {
        Difficulty::PLAYABLE
            .into_iter()
            .chain(std::iter::once(Difficulty::Unknown))
            .find(|d| d.ordinal() == ordinal)
    }

    /// Short column label (`spn`, `dpa`, ...)
    pub fn short_name(self) -> &'static str {
        match self {
            Difficulty::SpNormal => "spn",
            Difficulty::SpHyper => "sph",
            Difficulty::SpAnother => "spa",
            Difficulty::SpLeggendaria => "spl",
            Difficulty::DpNormal => "dpn",
            Difficulty::DpHyper => "dph",
            Difficulty::DpAnother => "dpa",
            Difficulty::DpLeggendaria => "dpl",
            Difficulty::Unknown => "unknown",
        }
    }

    fn slot(self) -> Option<usize> {
        Difficulty::PLAYABLE.iter().position(|d| *d == self)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// One value per playable difficulty category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerDifficulty<T>([T; 8]);

impl<T: Copy + Default> PerDifficulty<T> {
    /// Build by asking for each playable category in turn, stopping at the
    /// first failure.
    pub fn try_from_fn<E>(mut f: impl FnMut(Difficulty) -> Result<T, E>) -> Result<Self, E> {
        let mut values = [T::default(); 8];
        for (slot, difficulty) in Difficulty::PLAYABLE.into_iter().enumerate() {
            values[slot] = f(difficulty)?;
        }
        Ok(Self(values))
    }

    /// `None` only for `Difficulty::Unknown`
    pub fn get(&self, difficulty: Difficulty) -> Option<T> {
        difficulty.slot().map(|slot| self.0[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Difficulty, T)> + '_ {
        Difficulty::PLAYABLE.into_iter().zip(self.0.iter().copied())
    }
}

/// Coarse browsing bucket by first title character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Alphanumeric {
    Abcd,
    Efgh,
    Ijkl,
    Mnop,
    Qrst,
    Uvwxyz,
    Others,
}

impl Alphanumeric {
    /// Bucket for a title, case-insensitive; empty or non-letter titles go
    /// to `Others`.
    pub fn from_title(title: &str) -> Alphanumeric {
        let Some(first) = title.chars().next() else {
            return Alphanumeric::Others;
        };
        match first.to_ascii_uppercase() {
            'A'..='D' => Alphanumeric::Abcd,
            'E'..='H' => Alphanumeric::Efgh,
            'I'..='L' => Alphanumeric::Ijkl,
            'M'..='P' => Alphanumeric::Mnop,
            'Q'..='T' => Alphanumeric::Qrst,
            'U'..='Z' => Alphanumeric::Uvwxyz,
            _ => Alphanumeric::Others,
        }
    }
}

/// Raw field value of a materialized record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Int(i64),
    Text(String),
}

impl Token {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Token::Int(value) => Some(*value),
            Token::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Display form: text as-is, integers in decimal
    pub fn to_display(&self) -> String {
        match self {
            Token::Int(value) => value.to_string(),
            Token::Text(text) => text.clone(),
        }
    }
}

/// Tempo of one chart. `min == max` unless the chart changes speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BpmRange {
    pub min_bpm: u32,
    pub max_bpm: u32,
    /// Variable tempo ("soflan")
    pub soflan: bool,
}

impl BpmRange {
    pub fn fixed(bpm: u32) -> Self {
        Self {
            min_bpm: bpm,
            max_bpm: bpm,
            soflan: false,
        }
    }

    pub fn variable(min_bpm: u32, max_bpm: u32) -> Self {
        Self {
            min_bpm,
            max_bpm,
            soflan: true,
        }
    }

    /// Parse `"150"` or `"150〜180"` (ASCII `~` is accepted as well)
    pub fn parse(text: &str) -> Option<BpmRange> {
        let text = text.trim();
        match text.split_once(['〜', '~']) {
            Some((min, max)) => {
                let min = min.trim().parse().ok()?;
                let max = max.trim().parse().ok()?;
                Some(BpmRange::variable(min, max))
            }
            None => text.parse().ok().map(BpmRange::fixed),
        }
    }
}

/// Per-chart view of an assembled item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartMetadata {
    pub level: u32,
    pub note_count: u32,
    pub min_bpm: u32,
    pub max_bpm: u32,
    pub soflan: bool,
}

impl ChartMetadata {
    pub fn bpm(&self) -> BpmRange {
        BpmRange {
            min_bpm: self.min_bpm,
            max_bpm: self.max_bpm,
            soflan: self.soflan,
        }
    }
}

/// One catalog entry joined from all four tables.
///
/// `charts` holds a category only when both its level and its note count
/// are non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedItem {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub version_id: i64,
    pub version_name: String,
    pub alphanumeric: Alphanumeric,
    pub editions: EditionFlags,
    pub charts: BTreeMap<Difficulty, ChartMetadata>,
}

impl UnifiedItem {
    pub fn chart(&self, difficulty: Difficulty) -> Option<&ChartMetadata> {
        self.charts.get(&difficulty)
    }
}
