//! Multi-index catalog
//!
//! A `Catalog` is built once from assembled items and is immutable after
//! that. It is `Send + Sync`; share it behind an `Arc` to resolve queries
//! from many tasks at once.

pub mod index;
pub mod resolver;

use std::collections::HashMap;

use crate::assemble::{Assembly, SkippedKey};
use crate::types::{Difficulty, UnifiedItem};

pub use index::{CatalogIndex, IdSet};
pub use resolver::{Query, Resolution, UnresolvedReason};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<UnifiedItem>,
    positions: HashMap<String, usize>,
    index: CatalogIndex,
    skipped: Vec<SkippedKey>,
}

impl Catalog {
    pub fn from_items(items: Vec<UnifiedItem>) -> Self {
        Self::from_assembly(Assembly {
            items,
            skipped: Vec::new(),
        })
    }

    /// Build indices over an assembly, keeping its skip report
    pub fn from_assembly(assembly: Assembly) -> Self {
        let index = CatalogIndex::build(&assembly.items);
        let positions = assembly
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id.clone(), position))
            .collect();

        tracing::info!(
            items = assembly.items.len(),
            skipped = assembly.skipped.len(),
            "Catalog built"
        );

        Self {
            items: assembly.items,
            positions,
            index,
            skipped: assembly.skipped,
        }
    }

    /// Items in title-table order
    pub fn items(&self) -> &[UnifiedItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&UnifiedItem> {
        self.positions.get(id).map(|&position| &self.items[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keys left out because a join partner was missing
    pub fn skipped(&self) -> &[SkippedKey] {
        &self.skipped
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    /// The id for `title`, only when exactly one item carries it
    pub fn unique_by_title(&self, title: &str) -> Option<&str> {
        unique(self.index.titles(title))
    }

    /// The id for `artist`, only when exactly one item carries it
    pub fn unique_by_artist(&self, artist: &str) -> Option<&str> {
        unique(self.index.artists(artist))
    }

    pub fn resolve(&self, query: &Query) -> Resolution {
        resolver::resolve(&self.index, query)
    }

    pub fn resolve_by_play_metadata(
        &self,
        difficulty: Difficulty,
        level: u32,
        bpm: (u32, u32),
        note_count: Option<u32>,
    ) -> IdSet {
        resolver::resolve_by_play_metadata(&self.index, difficulty, level, bpm, note_count)
    }
}

fn unique(ids: Option<&IdSet>) -> Option<&str> {
    match ids {
        Some(ids) if ids.len() == 1 => ids.iter().next().map(String::as_str),
        _ => None,
    }
}
