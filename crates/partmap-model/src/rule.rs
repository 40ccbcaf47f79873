//! Mapping rule definitions.
//!
//! Rules come in two shapes: [`RuleEntry`] is the raw configuration form read
//! from a rule file, [`MappingRule`] is the validated, immutable form held by
//! the rule store.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Wildcard character recognised in rule patterns.
pub const WILDCARD: char = '*';

/// Default confidence for rules that do not declare one.
pub const DEFAULT_RULE_CONFIDENCE: f32 = 0.8;

/// The three independent reference kinds resolved for every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Symbol,
    Footprint,
    Category,
}

impl RuleCategory {
    /// All categories in resolution order.
    pub const ALL: [RuleCategory; 3] = [Self::Symbol, Self::Footprint, Self::Category];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::Footprint => "footprint",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a pattern is a plain literal or contains wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Exact,
    Wildcard,
}

impl RuleKind {
    /// Classifies a pattern string.
    pub fn of(pattern: &str) -> Self {
        if pattern.contains(WILDCARD) {
            Self::Wildcard
        } else {
            Self::Exact
        }
    }
}

/// A validated mapping rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Stable identifier, either declared or derived from the rule position.
    pub id: String,
    /// Trimmed pattern; `*` matches zero or more characters.
    pub pattern: String,
    pub kind: RuleKind,
    /// Destination reference (e.g. `Device:R`).
    pub target: String,
    /// Declared confidence in `[0, 1]`.
    pub confidence: f32,
    /// Lower-cased keywords used by semantic matching.
    pub keywords: BTreeSet<String>,
}

impl MappingRule {
    /// Number of literal (non-wildcard) characters in the pattern.
    pub fn specificity(&self) -> usize {
        pattern_specificity(&self.pattern)
    }

    /// True for patterns made only of wildcards, which match every input.
    pub fn is_universal(&self) -> bool {
        self.specificity() == 0
    }
}

/// Counts literal characters of a pattern.
pub fn pattern_specificity(pattern: &str) -> usize {
    pattern.chars().filter(|ch| *ch != WILDCARD).count()
}

/// Confidence as written in a rule file.
///
/// Rule files are hand-edited, so both `0.9` and `"0.9"` are accepted; the
/// rule store parses and range-checks the value at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawConfidence {
    Number(f64),
    Text(String),
}

impl RawConfidence {
    /// Parses into a confidence, returning `None` when the value is not a
    /// finite number inside `[0, 1]`.
    pub fn parse(&self) -> Option<f32> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(value as f32)
    }
}

impl fmt::Display for RawConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// One rule as declared in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub pattern: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<RawConfidence>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl RuleEntry {
    pub fn new(pattern: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            pattern: pattern.into(),
            target: target.into(),
            confidence: None,
            keywords: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(RawConfidence::Number(confidence));
        self
    }

    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

/// Categorised rule lists as read from a rule file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub symbol: Vec<RuleEntry>,
    #[serde(default)]
    pub footprint: Vec<RuleEntry>,
    #[serde(default)]
    pub category: Vec<RuleEntry>,
}

impl RuleConfig {
    pub fn entries(&self, category: RuleCategory) -> &[RuleEntry] {
        match category {
            RuleCategory::Symbol => &self.symbol,
            RuleCategory::Footprint => &self.footprint,
            RuleCategory::Category => &self.category,
        }
    }

    pub fn entries_mut(&mut self, category: RuleCategory) -> &mut Vec<RuleEntry> {
        match category {
            RuleCategory::Symbol => &mut self.symbol,
            RuleCategory::Footprint => &mut self.footprint,
            RuleCategory::Category => &mut self.category,
        }
    }
}
