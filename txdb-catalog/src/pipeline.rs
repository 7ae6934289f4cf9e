//! Catalog build pipeline
//!
//! Stages run strictly in order, each consuming its input fully:
//! extract → normalize → materialize → typed records (bitfield decode
//! included) → rule mining → assembly → indexing. Any structural error aborts
//! the whole build; there is no partial catalog.
//!
//! `refresh_catalog` drives the same pipeline through the fetcher and cache
//! collaborators, reusing a table's cached normalized artifact when the
//! fetcher reports it unchanged.

use std::collections::BTreeMap;
use txdb_common::collaborators::{ArtifactCache, CachedTable, FetchOutcome, TableFetcher};
use txdb_common::config::TxdbConfig;
use txdb_common::time::{format_last_modified, is_newer};
use txdb_common::{Error, Result, TableName};

use crate::assemble::{assemble, CatalogScope, SourceTables};
use crate::catalog::Catalog;
use crate::extract::{extract_block, Anchors};
use crate::materialize::{materialize_map, materialize_sequence};
use crate::normalize::{
    normalize_block, LevelRewriter, LineRewriter, NormalizedBlock, NoteBpmRewriter,
    TitleRewriter, VersionRewriter,
};
use crate::records::{LevelRecord, NoteBpmRecord, TitleRecord, VersionList};
use crate::rules::{extract_dispatch_body, mine_bpm_rules, DispatchAnchors};

/// Raw script text of the four tables
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTables {
    pub titles: String,
    pub levels: String,
    pub notes_bpm: String,
    pub versions: String,
}

impl RawTables {
    pub fn get(&self, table: TableName) -> &str {
        match table {
            TableName::Titles => &self.titles,
            TableName::Levels => &self.levels,
            TableName::NotesBpm => &self.notes_bpm,
            TableName::Versions => &self.versions,
        }
    }

    fn set(&mut self, table: TableName, text: String) {
        match table {
            TableName::Titles => self.titles = text,
            TableName::Levels => self.levels = text,
            TableName::NotesBpm => self.notes_bpm = text,
            TableName::Versions => self.versions = text,
        }
    }
}

/// The table-specific rewrite rules for `table`
pub fn rewriter_for(config: &TxdbConfig, table: TableName) -> Box<dyn LineRewriter> {
    let placeholder_key = config.placeholder_key.clone();
    match table {
        TableName::Titles => Box::new(TitleRewriter { placeholder_key }),
        TableName::Levels => Box::new(LevelRewriter { placeholder_key }),
        TableName::NotesBpm => Box::new(NoteBpmRewriter { placeholder_key }),
        TableName::Versions => Box::new(VersionRewriter {
            sentinel_version_id: config.sentinel_version_id,
        }),
    }
}

/// Extract and normalize one table's literal block from its raw source
pub fn normalize_table(config: &TxdbConfig, table: TableName, source: &str) -> Result<NormalizedBlock> {
    let settings = config.table(table);
    let anchors = Anchors::from_config(settings)?;
    let block = extract_block(source, &anchors)?;
    let rewriter = rewriter_for(config, table);
    let normalized = normalize_block(&settings.file_name, &block, &*rewriter)?;

    tracing::info!(
        table = %settings.file_name,
        lines = normalized.lines.len(),
        "Table extracted"
    );
    Ok(normalized)
}

/// Normalized blocks of all four tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTables {
    blocks: BTreeMap<TableName, NormalizedBlock>,
}

impl NormalizedTables {
    pub fn normalize(config: &TxdbConfig, raw: &RawTables) -> Result<Self> {
        let mut blocks = BTreeMap::new();
        for table in TableName::ALL {
            blocks.insert(table, normalize_table(config, table, raw.get(table))?);
        }
        Ok(Self { blocks })
    }

    pub fn get(&self, table: TableName) -> Option<&NormalizedBlock> {
        self.blocks.get(&table)
    }

    fn require(&self, table: TableName) -> Result<&NormalizedBlock> {
        self.blocks.get(&table).ok_or_else(|| Error::BlockNotFound {
            table: table.to_string(),
        })
    }
}

/// Materialize normalized blocks into typed tables and mine the tempo rules
/// from the raw note/tempo script.
pub fn parse_tables(
    config: &TxdbConfig,
    normalized: &NormalizedTables,
    notes_source: &str,
) -> Result<SourceTables> {
    let titles_name = &config.table(TableName::Titles).file_name;
    let titles = materialize_map(titles_name, normalized.require(TableName::Titles)?)?
        .iter()
        .map(|record| TitleRecord::from_record(titles_name, record))
        .collect::<Result<Vec<_>>>()?;

    let levels_name = &config.table(TableName::Levels).file_name;
    let levels = materialize_map(levels_name, normalized.require(TableName::Levels)?)?
        .iter()
        .map(|record| LevelRecord::from_record(levels_name, record).map(|r| (r.key.clone(), r)))
        .collect::<Result<BTreeMap<_, _>>>()?;

    let notes_name = &config.table(TableName::NotesBpm).file_name;
    let notes = materialize_map(notes_name, normalized.require(TableName::NotesBpm)?)?
        .iter()
        .map(|record| NoteBpmRecord::from_record(notes_name, record).map(|r| (r.key.clone(), r)))
        .collect::<Result<BTreeMap<_, _>>>()?;

    let versions_name = &config.table(TableName::Versions).file_name;
    let version_tokens = materialize_sequence(versions_name, normalized.require(TableName::Versions)?)?;
    let versions = VersionList::from_tokens(&version_tokens, config.sentinel_version_id);

    let dispatch = DispatchAnchors::from_config(&config.dispatch)?;
    let statements = extract_dispatch_body(notes_source, &dispatch)?;
    let rules = mine_bpm_rules(&statements)?;

    tracing::debug!(
        titles = titles.len(),
        levels = levels.len(),
        notes = notes.len(),
        versions = versions.len(),
        rules = rules.len(),
        "Tables parsed"
    );

    Ok(SourceTables {
        titles,
        levels,
        notes,
        rules,
        versions,
    })
}

/// Build a catalog from scratch out of the raw script text
pub fn build_catalog(config: &TxdbConfig, raw: &RawTables, scope: CatalogScope) -> Result<Catalog> {
    let normalized = NormalizedTables::normalize(config, raw)?;
    let tables = parse_tables(config, &normalized, &raw.notes_bpm)?;
    Ok(Catalog::from_assembly(assemble(&tables, scope)))
}

/// Outcome of one refresh run
#[derive(Debug, Clone)]
pub struct Refreshed {
    pub catalog: Catalog,
    /// Tables whose raw text was replaced in this run
    pub updated: Vec<TableName>,
    /// Tables rebuilt from a cached normalized artifact
    pub reused: Vec<TableName>,
}

/// Fetch, cache and rebuild.
///
/// For each table the fetcher is asked for anything newer than the cached
/// timestamp. Updated text replaces the cache entry wholesale. An unchanged
/// table reuses its cached normalized artifact when there is one, otherwise
/// its cached raw text is normalized again. The catalog itself is always
/// rebuilt in full.
pub fn refresh_catalog(
    fetcher: &dyn TableFetcher,
    cache: &mut dyn ArtifactCache,
    config: &TxdbConfig,
    scope: CatalogScope,
) -> Result<Refreshed> {
    let mut raw = RawTables::default();
    let mut blocks = BTreeMap::new();
    let mut updated = Vec::new();
    let mut reused = Vec::new();

    for table in TableName::ALL {
        let file_name = &config.table(table).file_name;
        let cached = cache.raw(table);
        let outcome = fetcher.fetch(table, file_name, cached.as_ref().map(|c| &c.last_modified))?;

        let changed = match outcome {
            FetchOutcome::Updated {
                text,
                last_modified,
            } => {
                if !is_newer(&last_modified, cached.as_ref().map(|c| &c.last_modified)) {
                    tracing::warn!(
                        table = %file_name,
                        last_modified = %format_last_modified(&last_modified),
                        "Fetcher returned new text without a newer timestamp"
                    );
                }
                tracing::info!(
                    table = %file_name,
                    last_modified = %format_last_modified(&last_modified),
                    "Updating cached table"
                );
                cache.store_raw(
                    table,
                    CachedTable {
                        text: text.clone(),
                        last_modified,
                    },
                );
                raw.set(table, text);
                updated.push(table);
                true
            }
            FetchOutcome::Unchanged => {
                let cached = cached.ok_or_else(|| Error::FetchUnavailable {
                    table: file_name.clone(),
                    reason: "reported unchanged but nothing is cached".to_string(),
                })?;
                tracing::info!(
                    table = %file_name,
                    last_modified = %format_last_modified(&cached.last_modified),
                    "Table not modified"
                );
                raw.set(table, cached.text);
                false
            }
        };

        let reusable = if changed { None } else { cache.normalized(table) };
        let block = match reusable {
            Some(artifact) => {
                tracing::debug!(table = %file_name, "Reusing cached normalized artifact");
                reused.push(table);
                NormalizedBlock::parse_rendered(file_name, &artifact)?
            }
            None => {
                let block = normalize_table(config, table, raw.get(table))?;
                cache.store_normalized(table, block.render());
                block
            }
        };
        blocks.insert(table, block);
    }

    let normalized = NormalizedTables { blocks };
    let tables = parse_tables(config, &normalized, &raw.notes_bpm)?;
    let catalog = Catalog::from_assembly(assemble(&tables, scope));

    Ok(Refreshed {
        catalog,
        updated,
        reused,
    })
}
