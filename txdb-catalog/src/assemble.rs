//! Metadata Assembler
//!
//! Joins the four tables and the mined tempo rules into `UnifiedItem`s.
//! A key missing from a table it must join against is skipped and reported,
//! never fatal.

use std::collections::{BTreeMap, BTreeSet};
use txdb_common::{Error, TableName};

use crate::bitfield::EditionFlags;
use crate::records::{LevelRecord, NoteBpmRecord, TitleRecord, VersionList};
use crate::rules::BpmRules;
use crate::types::{Alphanumeric, ChartMetadata, Difficulty, UnifiedItem};

/// Which editions an assembled catalog covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CatalogScope {
    /// Every titled key present in the level table
    #[default]
    All,
    /// Keys flagged for the extended-service edition
    ExtendedService,
    /// Keys in the current edition but not the extended-service edition
    CurrentNotInExtended,
}

impl CatalogScope {
    pub fn admits(self, editions: EditionFlags) -> bool {
        match self {
            CatalogScope::All => true,
            CatalogScope::ExtendedService => editions.extended_service,
            CatalogScope::CurrentNotInExtended => editions.current && !editions.extended_service,
        }
    }
}

/// A key left out of the catalog because a join partner is missing
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SkippedKey {
    pub key: String,
    pub missing_from: TableName,
}

impl SkippedKey {
    pub fn to_error(&self) -> Error {
        Error::MissingJoinKey {
            table: self.missing_from.to_string(),
            key: self.key.clone(),
        }
    }
}

/// All parsed tables of one build
#[derive(Debug, Clone)]
pub struct SourceTables {
    /// In upstream order
    pub titles: Vec<TitleRecord>,
    pub levels: BTreeMap<String, LevelRecord>,
    pub notes: BTreeMap<String, NoteBpmRecord>,
    pub rules: BpmRules,
    pub versions: VersionList,
}

/// Assembled items in title-table order, plus the skip report
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub items: Vec<UnifiedItem>,
    pub skipped: Vec<SkippedKey>,
}

pub fn assemble(tables: &SourceTables, scope: CatalogScope) -> Assembly {
    let mut assembly = Assembly::default();
    let mut titled = BTreeSet::new();

    for title in &tables.titles {
        titled.insert(title.key.as_str());

        let Some(level) = tables.levels.get(&title.key) else {
            skip(&mut assembly, &title.key, TableName::Levels);
            continue;
        };

        if !scope.admits(level.editions) {
            tracing::debug!(key = %title.key, ?scope, "Key outside catalog scope");
            continue;
        }

        let Some(notes) = tables.notes.get(&title.key) else {
            skip(&mut assembly, &title.key, TableName::NotesBpm);
            continue;
        };

        let Some(version_name) = tables.versions.name(title.version_id) else {
            skip(&mut assembly, &title.key, TableName::Versions);
            continue;
        };

        assembly.items.push(UnifiedItem {
            id: title.key.clone(),
            title: title.title.clone(),
            artist: title.artist.clone(),
            genre: title.genre.clone(),
            version_id: tables.versions.remap(title.version_id),
            version_name: version_name.to_string(),
            alphanumeric: Alphanumeric::from_title(&title.title),
            editions: level.editions,
            charts: charts_for(&title.key, level, notes, &tables.rules),
        });
    }

    for key in tables.levels.keys() {
        if !titled.contains(key.as_str()) {
            skip(&mut assembly, key, TableName::Titles);
        }
    }

    tracing::info!(
        items = assembly.items.len(),
        skipped = assembly.skipped.len(),
        ?scope,
        "Catalog items assembled"
    );
    assembly
}

fn charts_for(
    key: &str,
    level: &LevelRecord,
    notes: &NoteBpmRecord,
    rules: &BpmRules,
) -> BTreeMap<Difficulty, ChartMetadata> {
    let mut charts = BTreeMap::new();
    for (difficulty, rank) in level.levels.iter() {
        let note_count = notes.notes.get(difficulty).unwrap_or(0);
        if rank == 0 || note_count == 0 {
            continue;
        }

        let bpm = rules.get(key, difficulty).unwrap_or(notes.bpm);
        charts.insert(
            difficulty,
            ChartMetadata {
                level: rank,
                note_count,
                min_bpm: bpm.min_bpm,
                max_bpm: bpm.max_bpm,
                soflan: bpm.soflan,
            },
        );
    }
    charts
}

fn skip(assembly: &mut Assembly, key: &str, missing_from: TableName) {
    tracing::warn!(key = %key, table = %missing_from, "Skipping key missing from joined table");
    assembly.skipped.push(SkippedKey {
        key: key.to_string(),
        missing_from,
    });
}
