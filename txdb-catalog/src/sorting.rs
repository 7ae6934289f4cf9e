//! Sort orders offered to the renderer

use std::cmp::Ordering;

use crate::types::{Difficulty, UnifiedItem};

/// Version slot the sentinel edition sorts into: after 1, before 2
const SENTINEL_SORT_SLOT: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Alphanumeric bucket, then title
    Alphanumeric,
    /// Version, then title
    Version,
    /// Level of one difficulty, then title; items without that chart last
    Level(Difficulty),
}

impl SortOrder {
    /// Every order the renderer builds a table for
    pub fn all() -> Vec<SortOrder> {
        let mut orders = vec![SortOrder::Alphanumeric, SortOrder::Version];
        orders.extend(Difficulty::PLAYABLE.into_iter().map(SortOrder::Level));
        orders
    }

    /// Table identifier (`alphanumeric`, `version`, `spn`, ...)
    pub fn id(self) -> &'static str {
        match self {
            SortOrder::Alphanumeric => "alphanumeric",
            SortOrder::Version => "version",
            SortOrder::Level(difficulty) => difficulty.short_name(),
        }
    }

    pub fn compare(self, a: &UnifiedItem, b: &UnifiedItem) -> Ordering {
        let primary = match self {
            SortOrder::Alphanumeric => a.alphanumeric.cmp(&b.alphanumeric),
            SortOrder::Version => version_sort_key(a.version_id).cmp(&version_sort_key(b.version_id)),
            SortOrder::Level(difficulty) => level_sort_key(a, difficulty).cmp(&level_sort_key(b, difficulty)),
        };
        primary
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Sort key for a (remapped) version id. Numbered versions are spaced two
/// apart so the sentinel edition (`-1`) fits between the first and second.
pub fn version_sort_key(version_id: i64) -> i64 {
    if version_id == -1 {
        SENTINEL_SORT_SLOT
    } else {
        version_id * 2
    }
}

/// `(missing, level)`: present charts order before missing ones
fn level_sort_key(item: &UnifiedItem, difficulty: Difficulty) -> (bool, u32) {
    match item.chart(difficulty) {
        Some(chart) => (false, chart.level),
        None => (true, 0),
    }
}

/// Items ordered by `order`; the input is left untouched
pub fn sorted<'a>(items: &'a [UnifiedItem], order: SortOrder) -> Vec<&'a UnifiedItem> {
    let mut sorted: Vec<&UnifiedItem> = items.iter().collect();
    sorted.sort_by(|a, b| order.compare(a, b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitfield::EditionFlags;
    use crate::types::{Alphanumeric, ChartMetadata};
    use std::collections::BTreeMap;

    fn item(id: &str, title: &str, version_id: i64, spa: Option<u32>) -> UnifiedItem {
        let mut charts = BTreeMap::new();
        if let Some(level) = spa {
            charts.insert(
                Difficulty::SpAnother,
                ChartMetadata {
                    level,
                    note_count: 1000,
                    min_bpm: 150,
                    max_bpm: 150,
                    soflan: false,
                },
            );
        }
        UnifiedItem {
            id: id.to_string(),
            title: title.to_string(),
            artist: String::new(),
            genre: String::new(),
            version_id,
            version_name: String::new(),
            alphanumeric: Alphanumeric::from_title(title),
            editions: EditionFlags::default(),
            charts,
        }
    }

    fn ids(items: Vec<&UnifiedItem>) -> Vec<&str> {
        items.into_iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_sentinel_between_first_and_second() {
        assert!(version_sort_key(1) < version_sort_key(-1));
        assert!(version_sort_key(-1) < version_sort_key(2));
        assert!(version_sort_key(0) < version_sort_key(1));

        let items = vec![
            item("second", "b", 2, None),
            item("extra", "c", -1, None),
            item("first", "a", 1, None),
        ];
        assert_eq!(ids(sorted(&items, SortOrder::Version)), vec!["first", "extra", "second"]);
    }

    #[test]
    fn test_alphanumeric_then_title() {
        let items = vec![
            item("num", "5.1.1.", 1, None),
            item("z", "Zed", 1, None),
            item("b", "Bravo", 1, None),
            item("a", "alpha", 1, None),
        ];
        // "Bravo" < "alpha" bytewise inside the same bucket
        assert_eq!(
            ids(sorted(&items, SortOrder::Alphanumeric)),
            vec!["b", "a", "z", "num"]
        );
    }

    #[test]
    fn test_level_missing_charts_last() {
        let items = vec![
            item("none", "a", 1, None),
            item("twelve", "b", 1, Some(12)),
            item("five", "c", 1, Some(5)),
        ];
        assert_eq!(
            ids(sorted(&items, SortOrder::Level(Difficulty::SpAnother))),
            vec!["five", "twelve", "none"]
        );
    }

    #[test]
    fn test_all_orders() {
        let orders = SortOrder::all();
        assert_eq!(orders.len(), 10);
        assert_eq!(orders[0].id(), "alphanumeric");
        assert_eq!(orders[9].id(), "dpl");
    }
}
