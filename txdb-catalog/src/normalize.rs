//! Line Normalizer
//!
//! Turns the raw lines of a literal block into a regular one-record-per-line
//! notation: `"key":[field,field,...]` for map tables and
//! `value,value,...` for sequence tables. Whole-line `//` comments and blank
//! lines are dropped first; every surviving line then goes through a
//! table-specific `LineRewriter`, which must either rewrite it or reject it.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use txdb_common::{Error, Result};

use crate::extract::{BlockShape, LiteralBlock};

/// Outcome of rewriting one surviving line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewritten {
    Line(String),
    /// The reserved dummy row; dropped before materialization
    Placeholder,
}

/// Table-specific rewrite rules. `None` means the line cannot be parsed.
pub trait LineRewriter {
    fn rewrite(&self, line: &str) -> Option<Rewritten>;
}

impl<F> LineRewriter for F
where
    F: Fn(&str) -> Option<Rewritten>,
{
    fn rewrite(&self, line: &str) -> Option<Rewritten> {
        self(line)
    }
}

/// Normalized lines of one block, delimiters excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBlock {
    pub shape: BlockShape,
    pub lines: Vec<String>,
}

impl NormalizedBlock {
    /// Text form wrapped in the block's delimiter pair. This is what gets
    /// cached as the normalized artifact.
    pub fn render(&self) -> String {
        let mut text = String::new();
        text.push(self.shape.open());
        text.push('\n');
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text.push(self.shape.close());
        text.push('\n');
        text
    }

    /// Inverse of `render`, used when reusing a cached artifact
    pub fn parse_rendered(table: &str, text: &str) -> Result<NormalizedBlock> {
        let mut lines: Vec<&str> = text.lines().collect();
        let invalid = |reason: &str| Error::InvalidLiteral {
            table: table.to_string(),
            line: text.lines().next().unwrap_or_default().to_string(),
            reason: reason.to_string(),
        };

        if lines.len() < 2 {
            return Err(invalid("cached artifact is missing its delimiters"));
        }
        let shape = BlockShape::from_delimiter(lines[0].trim())
            .ok_or_else(|| invalid("cached artifact does not open with a delimiter"))?;
        let close = lines.pop().unwrap_or_default();
        if close.trim() != shape.close().to_string() {
            return Err(invalid("cached artifact closing delimiter does not match"));
        }

        Ok(NormalizedBlock {
            shape,
            lines: lines[1..].iter().map(|line| line.to_string()).collect(),
        })
    }
}

/// Normalize every retained line of `block`.
///
/// Fails with `UnparseableLine` on the first line the rewriter rejects; no
/// partial block is returned.
pub fn normalize_block(
    table: &str,
    block: &LiteralBlock,
    rewriter: &dyn LineRewriter,
) -> Result<NormalizedBlock> {
    let mut lines = Vec::with_capacity(block.lines.len());
    let mut placeholders = 0usize;

    for raw in &block.lines {
        let line = raw.trim();
        if line.starts_with("//") || line.is_empty() {
            continue;
        }

        match rewriter.rewrite(line) {
            Some(Rewritten::Line(rewritten)) => {
                let rewritten = rewritten.trim();
                if !rewritten.is_empty() {
                    lines.push(rewritten.to_string());
                }
            }
            Some(Rewritten::Placeholder) => placeholders += 1,
            None => {
                return Err(Error::UnparseableLine {
                    table: table.to_string(),
                    line: line.to_string(),
                })
            }
        }
    }

    tracing::debug!(
        table = %table,
        lines = lines.len(),
        placeholders,
        "Normalized block"
    );

    Ok(NormalizedBlock {
        shape: block.shape,
        lines,
    })
}

// ============================================================================
// Table-specific rewriters
// ============================================================================

static FONTCOLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.fontcolor\(.*?\)").unwrap());
static SPAN_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<span style='.*?'>").unwrap());
static DIV_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<div class=.*?>").unwrap());
static LEADING_SS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\s*SS\b").unwrap());
static SPAN_DECORATION: Lazy<Regex> = Lazy::new(|| Regex::new(r#",\s*"<span.*span>""#).unwrap());
static TRAILING_ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"//\s*\d+").unwrap());
static HEX_LEVEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-F])\b").unwrap());
static INDEXED_ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*vertbl\s*\[\s*(\d+)\s*\]\s*=\s*(.*)$").unwrap());

/// Closing markup tags, written with escaped slashes in the upstream source
const MARKUP_TAGS: [&str; 5] = [r"<\/span>", r"<\/div>", "<br>", "<b>", r"<\/b>"];

/// Split `'key':values` and canonicalize the key quoting to `"key"`.
fn split_keyed(line: &str) -> Option<(String, &str)> {
    let (key, values) = line.split_once(':')?;
    let key = key.trim();
    let inner = key
        .strip_prefix('\'')
        .and_then(|k| k.strip_suffix('\''))
        .or_else(|| key.strip_prefix('"').and_then(|k| k.strip_suffix('"')))?;
    if inner.is_empty() || inner.contains(['"', '\'']) {
        return None;
    }
    Some((inner.to_string(), values.trim()))
}

/// Rewrites for the title table: markup removal and the `SS` version token
#[derive(Debug, Clone)]
pub struct TitleRewriter {
    pub placeholder_key: String,
}

impl LineRewriter for TitleRewriter {
    fn rewrite(&self, line: &str) -> Option<Rewritten> {
        let (key, values) = split_keyed(line)?;
        if key == self.placeholder_key {
            return Some(Rewritten::Placeholder);
        }
        if !values.starts_with('[') {
            return None;
        }

        let mut values = FONTCOLOR.replace_all(values, "").into_owned();
        values = SPAN_OPEN.replace_all(&values, "").into_owned();
        values = DIV_OPEN.replace_all(&values, "").into_owned();
        for tag in MARKUP_TAGS {
            values = values.replace(tag, "");
        }
        values = LEADING_SS.replace(&values, "[-1").into_owned();
        values = values.replace('\t', "");

        Some(Rewritten::Line(format!("\"{}\":{}", key, values)))
    }
}

/// Rewrites for the level table: annotation removal and `A`–`F` level digits
#[derive(Debug, Clone)]
pub struct LevelRewriter {
    pub placeholder_key: String,
}

impl LineRewriter for LevelRewriter {
    fn rewrite(&self, line: &str) -> Option<Rewritten> {
        let (key, values) = split_keyed(line)?;
        if key == self.placeholder_key {
            return Some(Rewritten::Placeholder);
        }
        if !values.starts_with('[') {
            return None;
        }

        let values = SPAN_DECORATION.replace_all(values, "");
        let values = TRAILING_ANNOTATION.replace_all(&values, "");
        let values = HEX_LEVEL.replace_all(&values, |caps: &Captures| {
            let letter = caps[1].as_bytes()[0];
            (10 + (letter - b'A')).to_string()
        });

        Some(Rewritten::Line(format!("\"{}\":{}", key, values.trim())))
    }
}

/// Rewrites for the note-count/tempo table: quote canonicalization only
#[derive(Debug, Clone)]
pub struct NoteBpmRewriter {
    pub placeholder_key: String,
}

impl LineRewriter for NoteBpmRewriter {
    fn rewrite(&self, line: &str) -> Option<Rewritten> {
        let (key, values) = split_keyed(line)?;
        if key == self.placeholder_key {
            return Some(Rewritten::Placeholder);
        }
        if !values.starts_with('[') {
            return None;
        }
        Some(Rewritten::Line(format!("\"{}\":{}", key, values.replace('\'', "\""))))
    }
}

/// Rewrites for the version list: statement terminators and the indexed
/// assignment of the sentinel edition, which becomes a sequence append.
#[derive(Debug, Clone)]
pub struct VersionRewriter {
    pub sentinel_version_id: i64,
}

impl LineRewriter for VersionRewriter {
    fn rewrite(&self, line: &str) -> Option<Rewritten> {
        let mut line = line.replace(';', "");

        if let Some(caps) = INDEXED_ASSIGNMENT.captures(&line) {
            let index: i64 = caps[1].parse().ok()?;
            if index != self.sentinel_version_id {
                return None;
            }
            line = caps[2].to_string();
        }

        let line = line.trim_end();
        let line = line.strip_suffix(']').unwrap_or(line);
        Some(Rewritten::Line(line.to_string()))
    }
}
