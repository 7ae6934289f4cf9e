//! Staged resolver for noisy observations
//!
//! A `Query` carries what a caller could read off a result screen: up to two
//! renderings of the title, up to two of the artist, the chart's difficulty
//! and level, and optionally its tempo and note count. Resolution runs as a
//! fixed sequence of stages, each producing a `Resolution`:
//!
//! 1. difficulty/level lookup (no match ends resolution)
//! 2. title lookup, reconciling the two renderings
//! 3. title hits narrowed by the difficulty candidates (resolves only the
//!    id both renderings agree on)
//! 4. artist hits narrowed by the difficulty candidates (singleton only)
//! 5. tempo/note-count narrowing, when hints are present
//!
//! No stage ever picks among several candidates.

use serde::{Deserialize, Serialize};

use super::index::{CatalogIndex, IdSet};
use crate::types::Difficulty;

/// A partial, possibly noisy observation of one chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub titles: [Option<String>; 2],
    pub artists: [Option<String>; 2],
    pub difficulty: Difficulty,
    pub level: u32,
    /// `(min_bpm, max_bpm)`
    pub bpm: Option<(u32, u32)>,
    pub note_count: Option<u32>,
}

impl Query {
    pub fn new(difficulty: Difficulty, level: u32) -> Self {
        Self {
            titles: [None, None],
            artists: [None, None],
            difficulty,
            level,
            bpm: None,
            note_count: None,
        }
    }

    pub fn with_titles(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.titles = [Some(first.into()), Some(second.into())];
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.titles = [Some(title.into()), None];
        self
    }

    pub fn with_artists(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.artists = [Some(first.into()), Some(second.into())];
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artists = [Some(artist.into()), None];
        self
    }

    pub fn with_bpm(mut self, min_bpm: u32, max_bpm: u32) -> Self {
        self.bpm = Some((min_bpm, max_bpm));
        self
    }

    pub fn with_note_count(mut self, note_count: u32) -> Self {
        self.note_count = Some(note_count);
        self
    }
}

/// Why a query could not be narrowed to one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnresolvedReason {
    /// No item has a chart at the queried difficulty and level
    NoDifficultyMatch,
    /// Neither titles, artists nor hints identified a candidate
    NoMatch,
}

/// Outcome of resolving a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Resolved(String),
    /// Several items remain; more hints are needed
    Ambiguous(IdSet),
    Unresolved(UnresolvedReason),
}

impl Resolution {
    pub fn resolved_id(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Title hits after reconciling both renderings
#[derive(Debug, Clone, PartialEq, Eq)]
struct TitleHits {
    ids: IdSet,
    /// Set when the renderings agree on exactly one item
    chosen: Option<String>,
}

pub fn resolve(index: &CatalogIndex, query: &Query) -> Resolution {
    // Stage 1
    let Some(difficulty_set) = index.difficulty_level(query.difficulty, query.level) else {
        tracing::debug!(
            difficulty = %query.difficulty,
            level = query.level,
            "No chart at queried difficulty and level"
        );
        return Resolution::Unresolved(UnresolvedReason::NoDifficultyMatch);
    };

    // Stages 2 and 3
    let by_title = match title_hits(index, query) {
        Some(hits) => narrow_by_title(&hits, difficulty_set),
        None => Resolution::Unresolved(UnresolvedReason::NoMatch),
    };
    tracing::debug!(outcome = ?by_title, "Title stage");
    if by_title.is_resolved() {
        return by_title;
    }

    // Stage 4
    let by_artist = narrow_by_artist(index, query, difficulty_set);
    tracing::debug!(outcome = ?by_artist, "Artist stage");
    if by_artist.is_resolved() {
        return by_artist;
    }

    // Stage 5
    if let Some((min_bpm, max_bpm)) = query.bpm {
        let by_play = resolve_by_play_metadata(
            index,
            query.difficulty,
            query.level,
            (min_bpm, max_bpm),
            query.note_count,
        );
        let pool = match &by_title {
            Resolution::Ambiguous(ids) => ids,
            _ => difficulty_set,
        };
        let narrowed: IdSet = pool.intersection(&by_play).cloned().collect();
        tracing::debug!(candidates = narrowed.len(), "Play metadata stage");

        match narrowed.len() {
            0 => {}
            1 => return single(narrowed),
            _ => return Resolution::Ambiguous(narrowed),
        }
    }

    match by_title {
        Resolution::Ambiguous(ids) => Resolution::Ambiguous(ids),
        _ => Resolution::Unresolved(UnresolvedReason::NoMatch),
    }
}

/// Items at `difficulty`/`level` whose chart tempo range matches, further
/// narrowed by note count when given. The set is returned as-is.
pub fn resolve_by_play_metadata(
    index: &CatalogIndex,
    difficulty: Difficulty,
    level: u32,
    bpm: (u32, u32),
    note_count: Option<u32>,
) -> IdSet {
    let empty = IdSet::new();
    let difficulty_set = index.difficulty_level(difficulty, level).unwrap_or(&empty);
    let bpm_set = index.bpm(bpm.0, bpm.1).unwrap_or(&empty);

    let narrowed: IdSet = difficulty_set.intersection(bpm_set).cloned().collect();
    match note_count {
        Some(count) => {
            let notes_set = index.note_count(count).unwrap_or(&empty);
            narrowed.intersection(notes_set).cloned().collect()
        }
        None => narrowed,
    }
}

fn title_hits(index: &CatalogIndex, query: &Query) -> Option<TitleHits> {
    let hits: Vec<&IdSet> = query
        .titles
        .iter()
        .flatten()
        .filter_map(|title| index.titles(title))
        .collect();

    let ids = match hits.as_slice() {
        [] => return None,
        [only] => (*only).clone(),
        [first, second] if first == second => (*first).clone(),
        _ => {
            tracing::debug!("Title renderings disagree");
            hits.iter().flat_map(|set| set.iter().cloned()).collect()
        }
    };

    let chosen = if ids.len() == 1 {
        ids.iter().next().cloned()
    } else {
        None
    };
    Some(TitleHits { ids, chosen })
}

fn narrow_by_title(hits: &TitleHits, difficulty_set: &IdSet) -> Resolution {
    let narrowed: IdSet = hits.ids.intersection(difficulty_set).cloned().collect();

    if let Some(chosen) = &hits.chosen {
        if narrowed.contains(chosen) {
            return Resolution::Resolved(chosen.clone());
        }
    }

    // Without an agreed id even a single survivor is left to later stages
    if narrowed.is_empty() {
        Resolution::Unresolved(UnresolvedReason::NoMatch)
    } else {
        Resolution::Ambiguous(narrowed)
    }
}

fn narrow_by_artist(index: &CatalogIndex, query: &Query, difficulty_set: &IdSet) -> Resolution {
    let artist_ids: IdSet = query
        .artists
        .iter()
        .flatten()
        .filter_map(|artist| index.artists(artist))
        .flat_map(|set| set.iter().cloned())
        .collect();

    let narrowed: IdSet = artist_ids.intersection(difficulty_set).cloned().collect();
    if narrowed.len() == 1 {
        single(narrowed)
    } else {
        Resolution::Unresolved(UnresolvedReason::NoMatch)
    }
}

fn single(ids: IdSet) -> Resolution {
    match ids.into_iter().next() {
        Some(id) => Resolution::Resolved(id),
        None => Resolution::Unresolved(UnresolvedReason::NoMatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> IdSet {
        values.iter().map(|v| v.to_string()).collect()
    }

    /// Index with a difficulty set of {A, B, C} at SPA 10
    fn index() -> CatalogIndex {
        let mut index = CatalogIndex::default();
        index
            .by_difficulty_level
            .insert((Difficulty::SpAnother, 10), ids(&["A", "B", "C"]));
        index.by_title.insert("Beta".to_string(), ids(&["B"]));
        index.by_title.insert("Beta (alt)".to_string(), ids(&["B"]));
        index.by_title.insert("Shared".to_string(), ids(&["B", "C", "D"]));
        index.by_title.insert("Delta".to_string(), ids(&["D"]));
        index.by_title.insert("Bravo Delta".to_string(), ids(&["B", "D"]));
        index.by_artist.insert("dj B".to_string(), ids(&["B", "E"]));
        index.by_artist.insert("dj ABC".to_string(), ids(&["A", "B", "C"]));
        index.by_artist.insert("dj C".to_string(), ids(&["C"]));
        index.by_bpm.insert((150, 150), ids(&["B", "C"]));
        index.by_bpm.insert((120, 180), ids(&["A"]));
        index.by_note_count.insert(1500, ids(&["C"]));
        index
    }

    #[test]
    fn test_no_difficulty_match() {
        let query = Query::new(Difficulty::DpAnother, 10).with_title("Beta");
        assert_eq!(
            resolve(&index(), &query),
            Resolution::Unresolved(UnresolvedReason::NoDifficultyMatch)
        );
    }

    #[test]
    fn test_single_title_hit() {
        let query = Query::new(Difficulty::SpAnother, 10).with_title("Beta");
        assert_eq!(resolve(&index(), &query), Resolution::Resolved("B".to_string()));
    }

    #[test]
    fn test_renderings_agree() {
        let query = Query::new(Difficulty::SpAnother, 10).with_titles("Beta", "Beta (alt)");
        assert_eq!(resolve(&index(), &query).resolved_id(), Some("B"));
    }

    #[test]
    fn test_one_rendering_misses() {
        let query = Query::new(Difficulty::SpAnother, 10).with_titles("B3ta", "Beta");
        assert_eq!(resolve(&index(), &query).resolved_id(), Some("B"));
    }

    #[test]
    fn test_disagreeing_renderings_stay_ambiguous() {
        // union {B, D} narrows to {B}, but no id was agreed on
        let query = Query::new(Difficulty::SpAnother, 10).with_titles("Beta", "Delta");
        assert_eq!(resolve(&index(), &query), Resolution::Ambiguous(ids(&["B"])));
    }

    #[test]
    fn test_multi_hit_title_narrowed_to_one_is_not_resolved() {
        let query = Query::new(Difficulty::SpAnother, 10).with_title("Bravo Delta");
        assert_eq!(resolve(&index(), &query), Resolution::Ambiguous(ids(&["B"])));
    }

    #[test]
    fn test_artist_decides_after_title_narrowing() {
        let query = Query::new(Difficulty::SpAnother, 10)
            .with_title("Bravo Delta")
            .with_artist("dj B");
        assert_eq!(resolve(&index(), &query), Resolution::Resolved("B".to_string()));

        let query = Query::new(Difficulty::SpAnother, 10)
            .with_titles("Beta", "Delta")
            .with_artist("dj B");
        assert_eq!(resolve(&index(), &query), Resolution::Resolved("B".to_string()));
    }

    #[test]
    fn test_artist_overrides_lone_title_survivor() {
        // title narrows to {B}, artist points at C
        let query = Query::new(Difficulty::SpAnother, 10)
            .with_title("Bravo Delta")
            .with_artist("dj C");
        assert_eq!(resolve(&index(), &query), Resolution::Resolved("C".to_string()));
    }

    #[test]
    fn test_ambiguous_title_resolved_by_artist() {
        let query = Query::new(Difficulty::SpAnother, 10)
            .with_title("Shared")
            .with_artist("dj B");
        assert_eq!(resolve(&index(), &query), Resolution::Resolved("B".to_string()));
    }

    #[test]
    fn test_ambiguous_title_stays_ambiguous() {
        let query = Query::new(Difficulty::SpAnother, 10)
            .with_title("Shared")
            .with_artist("dj ABC");
        assert_eq!(resolve(&index(), &query), Resolution::Ambiguous(ids(&["B", "C"])));
    }

    #[test]
    fn test_nothing_narrows_is_unresolved() {
        let query = Query::new(Difficulty::SpAnother, 10).with_artist("dj ABC");
        assert_eq!(
            resolve(&index(), &query),
            Resolution::Unresolved(UnresolvedReason::NoMatch)
        );
    }

    #[test]
    fn test_play_metadata_narrows_ambiguous_title() {
        let query = Query::new(Difficulty::SpAnother, 10)
            .with_title("Shared")
            .with_bpm(150, 150)
            .with_note_count(1500);
        assert_eq!(resolve(&index(), &query).resolved_id(), Some("C"));
    }

    #[test]
    fn test_play_metadata_without_title() {
        let query = Query::new(Difficulty::SpAnother, 10).with_bpm(120, 180);
        assert_eq!(resolve(&index(), &query).resolved_id(), Some("A"));

        let query = Query::new(Difficulty::SpAnother, 10).with_bpm(150, 150);
        assert_eq!(resolve(&index(), &query), Resolution::Ambiguous(ids(&["B", "C"])));
    }

    #[test]
    fn test_resolve_by_play_metadata_returns_set() {
        let index = index();
        assert_eq!(
            resolve_by_play_metadata(&index, Difficulty::SpAnother, 10, (150, 150), None),
            ids(&["B", "C"])
        );
        assert_eq!(
            resolve_by_play_metadata(&index, Difficulty::SpAnother, 10, (150, 150), Some(1500)),
            ids(&["C"])
        );
        assert!(
            resolve_by_play_metadata(&index, Difficulty::SpAnother, 10, (90, 90), None).is_empty()
        );
        assert!(
            resolve_by_play_metadata(&index, Difficulty::DpNormal, 1, (150, 150), None).is_empty()
        );
    }
}
