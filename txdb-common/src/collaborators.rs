//! Interfaces to the collaborators that live outside the catalog core
//!
//! Fetching over the network and persisting artifacts to disk are owned by
//! the embedding application. The core only sees these two traits: a
//! synchronous fetcher that reports whether a table changed, and a cache that
//! holds one raw copy (plus freshness) and one normalized artifact per table.

use crate::table::TableName;
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Result of asking the fetcher for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Server copy is not newer than the cached timestamp
    Unchanged,
    /// New raw text with the server-supplied freshness timestamp
    Updated {
        text: String,
        last_modified: DateTime<Utc>,
    },
}

/// Supplies raw table text.
///
/// Implementations report failures as `Error::FetchUnavailable`; that error
/// is fatal to the refresh run.
pub trait TableFetcher {
    fn fetch(
        &self,
        table: TableName,
        file_name: &str,
        cached_last_modified: Option<&DateTime<Utc>>,
    ) -> Result<FetchOutcome>;
}

/// Cached raw text of one table and its freshness timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTable {
    pub text: String,
    pub last_modified: DateTime<Utc>,
}

/// Persisted intermediate state, keyed by table.
///
/// Entries are replaced wholesale, never merged. Storing new raw text drops
/// the table's normalized artifact because it no longer matches.
pub trait ArtifactCache {
    fn raw(&self, table: TableName) -> Option<CachedTable>;
    fn store_raw(&mut self, table: TableName, cached: CachedTable);
    fn normalized(&self, table: TableName) -> Option<String>;
    fn store_normalized(&mut self, table: TableName, text: String);
}

/// In-memory `ArtifactCache`
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    raw: HashMap<TableName, CachedTable>,
    normalized: HashMap<TableName, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactCache for MemoryCache {
    fn raw(&self, table: TableName) -> Option<CachedTable> {
        self.raw.get(&table).cloned()
    }

    fn store_raw(&mut self, table: TableName, cached: CachedTable) {
        self.normalized.remove(&table);
        self.raw.insert(table, cached);
    }

    fn normalized(&self, table: TableName) -> Option<String> {
        self.normalized.get(&table).cloned()
    }

    fn store_normalized(&mut self, table: TableName, text: String) {
        self.normalized.insert(table, text);
    }
}
