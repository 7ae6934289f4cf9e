//! Structured Materializer
//!
//! Parses normalized lines under a deliberately small grammar:
//!
//! ```text
//! map line      := "key" ":" "[" field ("," field)* "]" ","?
//! sequence line := ","? field ("," field)* ","?
//! field         := JSON integer | JSON string
//! ```
//!
//! Field lists are handed to `serde_json`, so JSON string escapes (including
//! the `\/` the upstream markup uses) are honoured. Anything else fails with
//! `InvalidLiteral`, which means the rewrite rules are out of date.

use serde_json::Value;
use std::collections::HashSet;
use txdb_common::{Error, Result};

use crate::extract::BlockShape;
use crate::normalize::NormalizedBlock;
use crate::types::Token;

/// One keyed row of a map-shaped table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub key: String,
    pub fields: Vec<Token>,
}

/// Materialize a map-shaped block into records, in source order.
///
/// A key that appears twice keeps its last definition (the upstream script
/// would do the same when evaluated).
pub fn materialize_map(table: &str, block: &NormalizedBlock) -> Result<Vec<NormalizedRecord>> {
    if block.shape != BlockShape::Map {
        return Err(invalid(table, "", "expected a map-shaped block"));
    }

    let mut records: Vec<NormalizedRecord> = Vec::with_capacity(block.lines.len());
    let mut seen = HashSet::new();

    for line in &block.lines {
        let record = parse_map_line(table, line)?;
        if !seen.insert(record.key.clone()) {
            tracing::warn!(table = %table, key = %record.key, "Duplicate key, keeping last definition");
            records.retain(|existing| existing.key != record.key);
        }
        records.push(record);
    }

    Ok(records)
}

/// Materialize a sequence-shaped block into one flat, ordered field list
pub fn materialize_sequence(table: &str, block: &NormalizedBlock) -> Result<Vec<Token>> {
    if block.shape != BlockShape::Sequence {
        return Err(invalid(table, "", "expected a sequence-shaped block"));
    }

    let mut tokens = Vec::new();
    for line in &block.lines {
        let fragment = line.trim().trim_matches(',').trim();
        if fragment.is_empty() {
            continue;
        }
        tokens.extend(parse_fields(table, line, &format!("[{}]", fragment))?);
    }
    Ok(tokens)
}

fn parse_map_line(table: &str, line: &str) -> Result<NormalizedRecord> {
    let body = line.trim();
    let body = body.strip_suffix(',').unwrap_or(body).trim_end();

    let (key, list) = body
        .split_once(':')
        .ok_or_else(|| invalid(table, line, "missing key separator"))?;
    let key: String = serde_json::from_str(key.trim())
        .map_err(|_| invalid(table, line, "key is not a quoted string"))?;

    let list = list.trim();
    if !(list.starts_with('[') && list.ends_with(']')) {
        return Err(invalid(table, line, "value is not a bracketed list"));
    }

    Ok(NormalizedRecord {
        key,
        fields: parse_fields(table, line, list)?,
    })
}

fn parse_fields(table: &str, line: &str, list: &str) -> Result<Vec<Token>> {
    let values: Vec<Value> = serde_json::from_str(list)
        .map_err(|e| invalid(table, line, &format!("malformed field list: {}", e)))?;

    values
        .into_iter()
        .map(|value| match value {
            Value::Number(number) => number
                .as_i64()
                .map(Token::Int)
                .ok_or_else(|| invalid(table, line, "non-integer number")),
            Value::String(text) => Ok(Token::Text(text)),
            other => Err(invalid(
                table,
                line,
                &format!("unsupported field {}", other),
            )),
        })
        .collect()
}

fn invalid(table: &str, line: &str, reason: &str) -> Error {
    Error::InvalidLiteral {
        table: table.to_string(),
        line: line.to_string(),
        reason: reason.to_string(),
    }
}
