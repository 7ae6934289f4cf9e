//! Integration tests for staged lookups against the sample catalog
//!
//! At SP ANOTHER level 10 the sample catalog holds `v`, `twin_a` and
//! `twin_b`; both `twin_*` items share the title "Twin" and a 140〜280 tempo.

mod helpers;

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;

use helpers::fixture_tables;
use txdb_catalog::{
    build_catalog, Catalog, CatalogScope, Difficulty, Query, Resolution, UnresolvedReason,
};
use txdb_common::config::TxdbConfig;

fn catalog() -> Catalog {
    build_catalog(&TxdbConfig::default(), &fixture_tables(), CatalogScope::All).unwrap()
}

fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Title stage
// ============================================================================

#[test]
fn test_unique_title_resolves() {
    let catalog = catalog();
    let query = Query::new(Difficulty::SpAnother, 10).with_title("V");
    assert_eq!(catalog.resolve(&query), Resolution::Resolved("v".to_string()));
}

#[test]
fn test_shared_title_is_ambiguous() {
    let catalog = catalog();
    let query = Query::new(Difficulty::SpAnother, 10).with_title("Twin");
    assert_eq!(catalog.resolve(&query), Resolution::Ambiguous(ids(&["twin_a", "twin_b"])));
}

#[test]
fn test_disagreeing_renderings_narrowed_by_difficulty() {
    let catalog = catalog();
    // "V" names a level 10 chart, "V2 (EMPRESS EDIT)" the only level 11 one of the pair
    // but the renderings never agreed, so the lone survivor is not picked
    let query = Query::new(Difficulty::SpAnother, 11).with_titles("V", "V2 (EMPRESS EDIT)");
    assert_eq!(catalog.resolve(&query), Resolution::Ambiguous(ids(&["v2"])));
}

#[test]
fn test_disagreeing_renderings_settled_by_artist() {
    let catalog = catalog();
    let query = Query::new(Difficulty::SpAnother, 11)
        .with_titles("V", "V2 (EMPRESS EDIT)")
        .with_artist("TAKA");
    assert_eq!(catalog.resolve(&query), Resolution::Resolved("v2".to_string()));
}

#[test]
fn test_one_unknown_rendering_still_resolves() {
    let catalog = catalog();
    let query = Query::new(Difficulty::SpAnother, 11).with_titles("QUASAR", "Quasar");
    assert_eq!(catalog.resolve(&query), Resolution::Resolved("quasar".to_string()));
}

#[test]
fn test_title_at_wrong_level_is_not_resolved() {
    let catalog = catalog();
    let query = Query::new(Difficulty::SpAnother, 10).with_title("GAMBOL");
    assert_eq!(
        catalog.resolve(&query),
        Resolution::Unresolved(UnresolvedReason::NoMatch)
    );
}

// ============================================================================
// Artist and play metadata stages
// ============================================================================

#[test]
fn test_artist_breaks_title_tie() {
    let catalog = catalog();
    let query = Query::new(Difficulty::SpAnother, 10)
        .with_title("Twin")
        .with_artist("dj B");
    assert_eq!(catalog.resolve(&query), Resolution::Resolved("twin_b".to_string()));
}

#[test]
fn test_artist_alone_narrowed_by_difficulty() {
    let catalog = catalog();
    // TAKA has `v` at level 10 and `v2` at level 11
    let query = Query::new(Difficulty::SpAnother, 11)
        .with_title("V2")
        .with_artists("TAKA", "Taka");
    assert_eq!(catalog.resolve(&query), Resolution::Resolved("v2".to_string()));
}

#[test]
fn test_note_count_breaks_title_tie() {
    let catalog = catalog();
    let query = Query::new(Difficulty::SpAnother, 10)
        .with_title("Twin")
        .with_bpm(140, 280)
        .with_note_count(1200);
    assert_eq!(catalog.resolve(&query), Resolution::Resolved("twin_b".to_string()));
}

#[test]
fn test_tempo_without_note_count_stays_ambiguous() {
    let catalog = catalog();
    let query = Query::new(Difficulty::SpAnother, 10)
        .with_title("Twin")
        .with_bpm(140, 280);
    assert_eq!(catalog.resolve(&query), Resolution::Ambiguous(ids(&["twin_a", "twin_b"])));
}

#[test]
fn test_tempo_only_query() {
    let catalog = catalog();
    let query = Query::new(Difficulty::SpAnother, 10).with_bpm(158, 158);
    assert_eq!(catalog.resolve(&query), Resolution::Resolved("v".to_string()));
}

#[test]
fn test_play_metadata_lookup() {
    let catalog = catalog();

    let found = catalog.resolve_by_play_metadata(Difficulty::DpAnother, 11, (140, 280), None);
    assert_eq!(found, ids(&["twin_b"]));

    let found = catalog.resolve_by_play_metadata(Difficulty::SpAnother, 11, (158, 158), None);
    assert_eq!(found, ids(&[]));

    let found = catalog.resolve_by_play_metadata(Difficulty::SpAnother, 10, (140, 280), Some(1100));
    assert_eq!(found, ids(&["twin_a"]));
}

// ============================================================================
// Misses
// ============================================================================

#[test]
fn test_no_chart_at_level() {
    let catalog = catalog();
    let query = Query::new(Difficulty::SpAnother, 9).with_title("V");
    assert_eq!(
        catalog.resolve(&query),
        Resolution::Unresolved(UnresolvedReason::NoDifficultyMatch)
    );
}

#[test]
fn test_nothing_matches() {
    let catalog = catalog();
    let query = Query::new(Difficulty::SpAnother, 10)
        .with_title("Unknown Song")
        .with_artist("nobody");
    assert_eq!(
        catalog.resolve(&query),
        Resolution::Unresolved(UnresolvedReason::NoMatch)
    );
}

#[test]
fn test_unique_lookups() {
    let catalog = catalog();
    assert_eq!(catalog.unique_by_title("GAMBOL"), Some("gambol"));
    assert_eq!(catalog.unique_by_title("Twin"), None);
    assert_eq!(catalog.unique_by_artist("SLAKE"), Some("gambol"));
    assert_eq!(catalog.unique_by_artist("TAKA"), None);
}

// ============================================================================
// Concurrent readers
// ============================================================================

#[tokio::test]
async fn test_concurrent_resolution() {
    let catalog = Arc::new(catalog());
    let queries = vec![
        (Query::new(Difficulty::SpAnother, 10).with_title("V"), "v"),
        (
            Query::new(Difficulty::SpAnother, 10).with_title("Twin").with_artist("dj A"),
            "twin_a",
        ),
        (Query::new(Difficulty::DpAnother, 8).with_title("GAMBOL"), "gambol"),
        (Query::new(Difficulty::SpLeggendaria, 12).with_title("Quasar"), "quasar"),
    ];

    let mut join_set = JoinSet::new();
    for task in 0..16 {
        let catalog = Arc::clone(&catalog);
        let (query, expected) = queries[task % queries.len()].clone();
        join_set.spawn(async move {
            let resolution = catalog.resolve(&query);
            assert_eq!(resolution.resolved_id(), Some(expected), "task {}", task);
            task
        });
    }

    let mut finished = Vec::new();
    while let Some(result) = join_set.join_next().await {
        finished.push(result.expect("task panicked"));
    }
    finished.sort();
    assert_eq!(finished, (0..16).collect::<Vec<_>>());
}
