//! Inverted indices over assembled items
//!
//! Every index maps a value to the set of item ids sharing it; collisions
//! are expected, especially on titles and artists. Indices are built once
//! from the full item list and never updated.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Difficulty, UnifiedItem};

/// Sorted, deduplicated item ids
pub type IdSet = BTreeSet<String>;

/// Lookup structures for the resolver
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogIndex {
    pub by_title: BTreeMap<String, IdSet>,
    pub by_artist: BTreeMap<String, IdSet>,
    pub by_difficulty_level: BTreeMap<(Difficulty, u32), IdSet>,
    pub by_bpm: BTreeMap<(u32, u32), IdSet>,
    pub by_note_count: BTreeMap<u32, IdSet>,
}

impl CatalogIndex {
    pub fn build(items: &[UnifiedItem]) -> Self {
        let mut index = CatalogIndex::default();

        for item in items {
            insert(&mut index.by_title, item.title.clone(), &item.id);
            insert(&mut index.by_artist, item.artist.clone(), &item.id);

            for (difficulty, chart) in &item.charts {
                insert(&mut index.by_difficulty_level, (*difficulty, chart.level), &item.id);
                insert(&mut index.by_bpm, (chart.min_bpm, chart.max_bpm), &item.id);
                insert(&mut index.by_note_count, chart.note_count, &item.id);
            }
        }

        tracing::debug!(
            titles = index.by_title.len(),
            artists = index.by_artist.len(),
            difficulty_levels = index.by_difficulty_level.len(),
            "Catalog indices built"
        );
        index
    }

    pub fn titles(&self, title: &str) -> Option<&IdSet> {
        self.by_title.get(title)
    }

    pub fn artists(&self, artist: &str) -> Option<&IdSet> {
        self.by_artist.get(artist)
    }

    pub fn difficulty_level(&self, difficulty: Difficulty, level: u32) -> Option<&IdSet> {
        self.by_difficulty_level.get(&(difficulty, level))
    }

    pub fn bpm(&self, min_bpm: u32, max_bpm: u32) -> Option<&IdSet> {
        self.by_bpm.get(&(min_bpm, max_bpm))
    }

    pub fn note_count(&self, note_count: u32) -> Option<&IdSet> {
        self.by_note_count.get(&note_count)
    }
}

fn insert<K: Ord>(index: &mut BTreeMap<K, IdSet>, key: K, id: &str) {
    index.entry(key).or_default().insert(id.to_string());
}
