//! Literal Block Extractor
//!
//! Isolates the text span holding one literal table inside a script source.
//! Scanning is a two-state machine: lines before the start anchor are
//! ignored, lines after it are retained until the end anchor matches.
//!
//! Anchor patterns behave like a match at the start of the line. The start
//! anchor must expose the opening delimiter (`{` or `[`) as its first capture
//! group; any further captures are data belonging to the first retained line.

use regex::Regex;
use txdb_common::config::TableConfig;
use txdb_common::{Error, Result};

/// Shape of a literal table, fixed by its opening delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockShape {
    /// `{ key: [...], ... }`
    Map,
    /// `[ value, ... ]`
    Sequence,
}

impl BlockShape {
    pub fn from_delimiter(delimiter: &str) -> Option<BlockShape> {
        match delimiter {
            "{" => Some(BlockShape::Map),
            "[" => Some(BlockShape::Sequence),
            _ => None,
        }
    }

    pub fn open(self) -> char {
        match self {
            BlockShape::Map => '{',
            BlockShape::Sequence => '[',
        }
    }

    pub fn close(self) -> char {
        match self {
            BlockShape::Map => '}',
            BlockShape::Sequence => ']',
        }
    }
}

/// Raw lines of one literal table, delimiters excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralBlock {
    pub shape: BlockShape,
    pub lines: Vec<String>,
}

/// Compiled start/end anchors for one table
#[derive(Debug, Clone)]
pub struct Anchors {
    table: String,
    start: Regex,
    end: Regex,
}

impl Anchors {
    /// Compile a table's anchors. Fails with `MalformedAnchor` when either
    /// pattern is invalid or the start pattern has no capture group.
    pub fn compile(table: &str, start: &str, end: &str) -> Result<Self> {
        let start_regex = compile_anchored(table, start)?;
        // captures_len() counts the implicit whole-match group
        if start_regex.captures_len() < 2 {
            return Err(Error::MalformedAnchor {
                table: table.to_string(),
                pattern: start.to_string(),
                reason: "start anchor needs a capture group for the opening delimiter".to_string(),
            });
        }
        let end_regex = compile_anchored(table, end)?;

        Ok(Self {
            table: table.to_string(),
            start: start_regex,
            end: end_regex,
        })
    }

    pub fn from_config(settings: &TableConfig) -> Result<Self> {
        Self::compile(&settings.file_name, &settings.start_anchor, &settings.end_anchor)
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

/// Compile `pattern` so it only matches at the start of a line
pub(crate) fn compile_anchored(table: &str, pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})", pattern)).map_err(|e| Error::MalformedAnchor {
        table: table.to_string(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

enum ScanState {
    BeforeBlock,
    InsideBlock(BlockShape),
}

/// Extract the first block delimited by `anchors` from `source`.
///
/// Errors:
/// - `MalformedAnchor` when the start anchor matches but its first capture
///   is not an opening delimiter (aborts, never skipped)
/// - `BlockNotFound` when the start anchor never matches
/// - `UnterminatedBlock` when the end anchor never matches; an end anchor
///   that matches an empty line also accepts the end of the text
pub fn extract_block(source: &str, anchors: &Anchors) -> Result<LiteralBlock> {
    let mut state = ScanState::BeforeBlock;
    let mut lines = Vec::new();

    for line in source.lines() {
        match state {
            ScanState::BeforeBlock => {
                let Some(captures) = anchors.start.captures(line) else {
                    continue;
                };
                let delimiter = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
                let shape =
                    BlockShape::from_delimiter(delimiter).ok_or_else(|| Error::MalformedAnchor {
                        table: anchors.table.clone(),
                        pattern: anchors.start.as_str().to_string(),
                        reason: format!(
                            "first capture must be an opening delimiter, got {:?}",
                            delimiter
                        ),
                    })?;

                let extras: String = captures
                    .iter()
                    .skip(2)
                    .flatten()
                    .map(|m| m.as_str())
                    .collect();
                if !extras.trim().is_empty() {
                    lines.push(extras);
                }

                tracing::debug!(table = %anchors.table, ?shape, "Block start anchor matched");
                state = ScanState::InsideBlock(shape);
            }
            ScanState::InsideBlock(shape) => {
                if anchors.end.is_match(line) {
                    tracing::debug!(
                        table = %anchors.table,
                        lines = lines.len(),
                        "Block end anchor matched"
                    );
                    return Ok(LiteralBlock { shape, lines });
                }
                lines.push(line.to_string());
            }
        }
    }

    match state {
        ScanState::BeforeBlock => Err(Error::BlockNotFound {
            table: anchors.table.clone(),
        }),
        ScanState::InsideBlock(shape) if anchors.end.is_match("") => {
            Ok(LiteralBlock { shape, lines })
        }
        ScanState::InsideBlock(_) => Err(Error::UnterminatedBlock {
            table: anchors.table.clone(),
        }),
    }
}
