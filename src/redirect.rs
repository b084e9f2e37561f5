//! Redirect/alias tables and display-sequence rules.
//!
//! Both redirect tables are flat key=value property sources mapping one path
//! segment to another. Keys and values get exactly one leading and one
//! trailing slash trimmed (never repeated), blank values are dropped, and
//! targets are not validated: a dangling redirect simply fails onward lookup
//! at request time. Permanent entries carry 301 semantics, temporary entries
//! (aliases) 302; precedence between the two is enforced by the resolver.

use std::collections::HashMap;

use regex::Regex;
use tracing::warn;

use crate::config::parse_properties;

/// Trims exactly one leading and one trailing slash.
pub fn trim_slashes(segment: &str) -> &str {
    let segment = segment.strip_prefix('/').unwrap_or(segment);
    segment.strip_suffix('/').unwrap_or(segment)
}

/// Builds a redirect table from flat key=value property text.
pub fn parse_redirects(text: &str) -> HashMap<String, String> {
    let mut table = HashMap::new();
    for (key, value) in parse_properties(text) {
        if value.trim().is_empty() {
            continue;
        }
        let src = trim_slashes(&key).to_string();
        let dst = trim_slashes(&value).to_string();
        table.insert(src, dst);
    }
    table
}

/// Ordered regular expressions ranking bundles for display. Never consulted
/// during resolution.
#[derive(Debug, Default)]
pub struct SequenceRules {
    rules: Vec<Regex>,
}

impl SequenceRules {
    /// Parses a sequence listing: one pattern per line, `#` starts a comment
    /// (inline comments stripped), malformed patterns are logged and skipped.
    pub fn parse(text: &str) -> Self {
        let mut rules = Vec::new();
        for raw in text.lines() {
            let line = match raw.find('#') {
                Some(hash) => &raw[..hash],
                None => raw,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match Regex::new(line) {
                Ok(rule) => rules.push(rule),
                Err(e) => warn!(pattern = line, error = %e, "Ignoring malformed sequence rule"),
            }
        }
        SequenceRules { rules }
    }

    /// The display rank of a bundle key: the index of the first matching
    /// rule, or the rule count when nothing matches (sorts last).
    pub fn order_of(&self, key: &str) -> usize {
        self.rules
            .iter()
            .position(|rule| rule.is_match(key))
            .unwrap_or(self.rules.len())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
