//! JSON document handed to the renderer
//!
//! Each item's `charts` object carries a difficulty only when both its level
//! and note count are non-zero. Renderers rely on that rule.

use serde::Serialize;
use std::collections::BTreeMap;
use txdb_common::Result;

use crate::types::{Alphanumeric, ChartMetadata, UnifiedItem};

#[derive(Debug, Serialize)]
struct ItemDocument<'a> {
    id: &'a str,
    title: &'a str,
    artist: &'a str,
    genre: &'a str,
    version_id: i64,
    version_name: &'a str,
    alphanumeric: Alphanumeric,
    current_edition: bool,
    extended_service: bool,
    charts: BTreeMap<&'static str, &'a ChartMetadata>,
}

impl<'a> ItemDocument<'a> {
    fn new(item: &'a UnifiedItem) -> Self {
        let charts = item
            .charts
            .iter()
            .filter(|(_, chart)| chart.level != 0 && chart.note_count != 0)
            .map(|(difficulty, chart)| (difficulty.short_name(), chart))
            .collect();

        Self {
            id: &item.id,
            title: &item.title,
            artist: &item.artist,
            genre: &item.genre,
            version_id: item.version_id,
            version_name: &item.version_name,
            alphanumeric: item.alphanumeric,
            current_edition: item.editions.current,
            extended_service: item.editions.extended_service,
            charts,
        }
    }
}

pub fn to_value(items: &[UnifiedItem]) -> Result<serde_json::Value> {
    let documents: Vec<ItemDocument<'_>> = items.iter().map(ItemDocument::new).collect();
    Ok(serde_json::to_value(documents)?)
}

pub fn to_json(items: &[UnifiedItem]) -> Result<String> {
    let documents: Vec<ItemDocument<'_>> = items.iter().map(ItemDocument::new).collect();
    Ok(serde_json::to_string_pretty(&documents)?)
}
