//! Conditional Rule Miner
//!
//! The note/tempo script carries a dispatch function that overrides the
//! shared tempo of some keys for particular difficulties:
//!
//! ```text
//! function get_bpm(tag,type){
//!     switch(tag){
//!     case "a": if(type>=9)return "150〜180";
//!     case "b":
//!     case "c": if(type==4||type==10)return "75〜300";break;
//!     }
//! }
//! ```
//!
//! `extract_dispatch_body` isolates the switch body and splits it into
//! statements; `mine_bpm_rules` turns the statements into explicit
//! (key, difficulty) → tempo rules. Bare case labels wait on a pending stack
//! and receive the rule set that is current when the next `break` arrives.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use txdb_common::config::DispatchConfig;
use txdb_common::{Error, Result};

use crate::extract::compile_anchored;
use crate::types::{BpmRange, Difficulty};

/// Label used in errors raised while locating the dispatch function
pub const DISPATCH_LABEL: &str = "tempo dispatch";

static CASE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*case\s*"(.*?)"\s*:(.*)$"#).unwrap());
static CONDITIONAL_RETURN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*if\s*\((.*)\)\s*return\s*"(.*)"\s*$"#).unwrap());
static FALLTHROUGH_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*break\s*$").unwrap());
static DEFAULT_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*default\s*:").unwrap());
static THRESHOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*type\s*([=<>!]+)\s*(\d+)\s*$").unwrap());

// ============================================================================
// Dispatch body extraction
// ============================================================================

/// Compiled anchors for the dispatch function
#[derive(Debug, Clone)]
pub struct DispatchAnchors {
    function: Regex,
    switch: Regex,
    end: Regex,
}

impl DispatchAnchors {
    pub fn from_config(config: &DispatchConfig) -> Result<Self> {
        Ok(Self {
            function: compile_anchored(DISPATCH_LABEL, &config.function_anchor)?,
            switch: compile_anchored(DISPATCH_LABEL, &config.switch_anchor)?,
            end: compile_anchored(DISPATCH_LABEL, &config.end_anchor)?,
        })
    }
}

enum DispatchScan {
    BeforeFunction,
    InsideFunction,
    InsideSwitch,
}

/// Split the switch body of the dispatch function into trimmed statements
pub fn extract_dispatch_body(source: &str, anchors: &DispatchAnchors) -> Result<Vec<String>> {
    let mut state = DispatchScan::BeforeFunction;
    let mut statements = Vec::new();

    for raw in source.lines() {
        let line = raw.trim();
        match state {
            DispatchScan::BeforeFunction => {
                if anchors.function.is_match(line) {
                    state = DispatchScan::InsideFunction;
                }
            }
            DispatchScan::InsideFunction => {
                if anchors.switch.is_match(line) {
                    state = DispatchScan::InsideSwitch;
                }
            }
            DispatchScan::InsideSwitch => {
                if anchors.end.is_match(line) {
                    tracing::debug!(statements = statements.len(), "Dispatch body extracted");
                    return Ok(statements);
                }
                statements.extend(
                    line.split(';')
                        .map(str::trim)
                        .filter(|statement| !statement.is_empty())
                        .map(str::to_string),
                );
            }
        }
    }

    match state {
        DispatchScan::BeforeFunction => Err(Error::UnrecognizedDispatchShape(
            "dispatch function not found".to_string(),
        )),
        DispatchScan::InsideFunction => Err(Error::UnrecognizedDispatchShape(
            "dispatch function has no switch on the key".to_string(),
        )),
        DispatchScan::InsideSwitch => Err(Error::UnterminatedBlock {
            table: DISPATCH_LABEL.to_string(),
        }),
    }
}

// ============================================================================
// Rule mining
// ============================================================================

/// Tempo overrides for one key
pub type RuleSet = BTreeMap<Difficulty, BpmRange>;

/// Mined tempo overrides, keyed by catalog key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BpmRules {
    rules: BTreeMap<String, RuleSet>,
}

impl BpmRules {
    pub fn get(&self, key: &str, difficulty: Difficulty) -> Option<BpmRange> {
        self.rules.get(key).and_then(|set| set.get(&difficulty)).copied()
    }

    pub fn rule_set(&self, key: &str) -> Option<&RuleSet> {
        self.rules.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Case labels seen without a condition of their own, most recent on top
#[derive(Debug, Default)]
struct PendingKeys {
    stack: Vec<String>,
}

impl PendingKeys {
    fn push(&mut self, key: String) {
        self.stack.push(key);
    }

    /// Pop every pending key, most recent first
    fn drain(&mut self) -> impl Iterator<Item = String> + '_ {
        std::iter::from_fn(move || self.stack.pop())
    }

    fn len(&self) -> usize {
        self.stack.len()
    }
}

#[derive(Default)]
struct RuleMiner {
    rules: BTreeMap<String, RuleSet>,
    pending: PendingKeys,
    current: Option<String>,
}

impl RuleMiner {
    fn feed(&mut self, statement: &str) -> Result<()> {
        let mut rest = statement.trim();
        if rest.is_empty() {
            return Ok(());
        }

        // Several labels may share one statement: `case "a":case "b":if(...)`
        while let Some(caps) = CASE_LABEL.captures(rest) {
            let key = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let remainder = caps.get(2).map_or("", |m| m.as_str()).trim();
            self.current = Some(key.clone());

            if remainder.is_empty() {
                self.pending.push(key);
                return Ok(());
            }
            if CASE_LABEL.is_match(remainder) {
                self.pending.push(key);
                rest = remainder;
                continue;
            }
            return self.add_condition(&key, remainder, statement);
        }

        if FALLTHROUGH_MARKER.is_match(rest) {
            self.fallthrough();
            return Ok(());
        }

        if DEFAULT_LABEL.is_match(rest) {
            return Ok(());
        }

        let Some(key) = self.current.clone() else {
            return Err(unrecognized(statement, "condition before any case label"));
        };
        self.add_condition(&key, rest, statement)
    }

    fn add_condition(&mut self, key: &str, text: &str, statement: &str) -> Result<()> {
        let caps = CONDITIONAL_RETURN
            .captures(text)
            .ok_or_else(|| unrecognized(statement, "expected `if (...) return \"...\"`"))?;
        let condition = caps.get(1).map_or("", |m| m.as_str());
        let literal = caps.get(2).map_or("", |m| m.as_str());

        let parsed = parse_condition(condition, literal, statement)?;
        tracing::debug!(key = %key, difficulties = parsed.len(), "Mined tempo condition");
        self.rules.entry(key.to_string()).or_default().extend(parsed);
        Ok(())
    }

    fn fallthrough(&mut self) {
        let inherited = self
            .current
            .as_ref()
            .and_then(|key| self.rules.get(key))
            .cloned()
            .unwrap_or_default();

        if self.pending.len() > 0 {
            tracing::debug!(
                pending = self.pending.len(),
                rules = inherited.len(),
                "Fallthrough group resolved"
            );
        }

        let keys: Vec<String> = self.pending.drain().collect();
        if inherited.is_empty() {
            return;
        }
        for key in keys {
            self.rules.insert(key, inherited.clone());
        }
    }

    fn finish(self) -> BpmRules {
        if self.pending.len() > 0 {
            tracing::warn!(
                pending = self.pending.len(),
                "Case labels left without a terminating break; they get no tempo rules"
            );
        }
        BpmRules { rules: self.rules }
    }
}

/// Mine tempo rules from the dispatch statements.
///
/// Any statement outside the case/condition/break grammar fails with
/// `UnrecognizedDispatchShape`.
pub fn mine_bpm_rules<S: AsRef<str>>(statements: &[S]) -> Result<BpmRules> {
    let mut miner = RuleMiner::default();
    for statement in statements {
        miner.feed(statement.as_ref())?;
    }
    let rules = miner.finish();
    tracing::info!(keys = rules.len(), "Tempo rules mined");
    Ok(rules)
}

/// Parse `type>=3||type==7` with tempo literal `150〜180`
fn parse_condition(condition: &str, literal: &str, statement: &str) -> Result<RuleSet> {
    let bpm = BpmRange::parse(literal)
        .ok_or_else(|| unrecognized(statement, &format!("unreadable tempo literal {:?}", literal)))?;

    let mut parsed = RuleSet::new();
    for part in condition.split("||") {
        let caps = THRESHOLD
            .captures(part)
            .ok_or_else(|| unrecognized(statement, &format!("unexpected condition {:?}", part)))?;
        let comparator = caps.get(1).map_or("", |m| m.as_str());
        let threshold: u32 = caps
            .get(2)
            .map_or("", |m| m.as_str())
            .parse()
            .map_err(|_| unrecognized(statement, "threshold out of range"))?;

        let selected: Vec<Difficulty> = match comparator {
            "==" => {
                let difficulty = Difficulty::from_ordinal(threshold)
                    .filter(|d| *d != Difficulty::Unknown)
                    .ok_or_else(|| {
                        unrecognized(statement, &format!("no difficulty with ordinal {}", threshold))
                    })?;
                vec![difficulty]
            }
            ">=" => Difficulty::PLAYABLE
                .into_iter()
                .filter(|d| d.ordinal() >= threshold)
                .collect(),
            "<=" => Difficulty::PLAYABLE
                .into_iter()
                .filter(|d| d.ordinal() <= threshold)
                .collect(),
            other => {
                return Err(unrecognized(
                    statement,
                    &format!("unsupported comparator {}", other),
                ))
            }
        };

        for difficulty in selected {
            parsed.insert(difficulty, bpm);
        }
    }
    Ok(parsed)
}

fn unrecognized(statement: &str, reason: &str) -> Error {
    Error::UnrecognizedDispatchShape(format!("{}: {}", reason, statement))
}
