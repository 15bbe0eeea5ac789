//! Ordered multi-pattern content matcher.
//!
//! A [`ContentMatcher`] holds an ordered list of literal and regular-expression
//! rules. [`ContentMatcher::find`] tries them in load order and returns the
//! first rule that matches anywhere in the text, together with the matched
//! span. Order is the priority: an earlier rule wins even when a later one
//! would produce a longer or earlier match.
//!
//! Patterns are compiled once in [`ContentMatcher::load`]; a malformed regex
//! fails the whole load, so a matcher never exists with a partial rule set.

pub mod builtin;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// How a rule's pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Case-sensitive substring containment.
    Literal,
    /// Regular expression, matched anywhere in the text.
    Regex,
}

/// A declarative match rule as supplied by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    pub id: String,
    pub kind: MatchKind,
    pub pattern: String,
}

impl MatchRule {
    pub fn literal(id: &str, pattern: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: MatchKind::Literal,
            pattern: pattern.to_string(),
        }
    }

    pub fn regex(id: &str, pattern: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: MatchKind::Regex,
            pattern: pattern.to_string(),
        }
    }
}

/// The first match found by a [`ContentMatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub rule_id: String,
    pub matched_text: String,
    /// Byte offset of the match within the searched text.
    pub offset: usize,
}

enum CompiledPattern {
    Literal(String),
    Regex(Regex),
}

struct CompiledRule {
    id: String,
    pattern: CompiledPattern,
}

/// Immutable, thread-safe ordered rule set.
pub struct ContentMatcher {
    rules: Vec<CompiledRule>,
}

impl ContentMatcher {
    /// Compile `rules` in the given order.
    ///
    /// Returns [`Error::InvalidPattern`] for the first regex that fails to
    /// compile.
    pub fn load(rules: &[MatchRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let pattern = match rule.kind {
                MatchKind::Literal => CompiledPattern::Literal(rule.pattern.clone()),
                MatchKind::Regex => {
                    let regex =
                        Regex::new(&rule.pattern).map_err(|source| Error::InvalidPattern {
                            rule_id: rule.id.clone(),
                            source,
                        })?;
                    CompiledPattern::Regex(regex)
                }
            };
            compiled.push(CompiledRule {
                id: rule.id.clone(),
                pattern,
            });
        }
        debug!("Loaded {} match rules", compiled.len());
        Ok(Self { rules: compiled })
    }

    /// Return the match of the lowest-index rule that matches `text`.
    pub fn find(&self, text: &str) -> Option<MatchResult> {
        self.rules.iter().find_map(|rule| {
            let (offset, matched) = match &rule.pattern {
                CompiledPattern::Literal(lit) => {
                    let offset = text.find(lit.as_str())?;
                    (offset, lit.as_str())
                }
                CompiledPattern::Regex(re) => {
                    let m = re.find(text)?;
                    (m.start(), m.as_str())
                }
            };
            Some(MatchResult {
                rule_id: rule.id.clone(),
                matched_text: matched.to_string(),
                offset,
            })
        })
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for ContentMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentMatcher")
            .field("rules", &self.rules.iter().map(|r| &r.id).collect::<Vec<_>>())
            .finish()
    }
}
