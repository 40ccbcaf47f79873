//! Mapping results produced by the engine.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::ComponentRecord;
use crate::rule::RuleCategory;

/// Which resolution strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Cache,
    Pattern,
    Fuzzy,
    Keyword,
    Fallback,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Self::Cache,
        Self::Pattern,
        Self::Fuzzy,
        Self::Keyword,
        Self::Fallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Pattern => "pattern",
            Self::Fuzzy => "fuzzy",
            Self::Keyword => "keyword",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved destination reference for one category of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    /// Destination reference.
    pub target: String,
    /// Certainty in `[0, 1]`.
    pub confidence: f32,
    pub strategy: Strategy,
    /// Rule that produced the target, when a rule was involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<String>,
    /// Source fields (name -> value) whose content produced the match.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_mappings: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl MappingResult {
    /// Creates a result, clamping `confidence` into `[0, 1]`.
    ///
    /// Non-finite confidences collapse to `0.0`.
    pub fn new(target: impl Into<String>, confidence: f32, strategy: Strategy) -> Self {
        Self {
            target: target.into(),
            confidence: clamp_confidence(confidence),
            strategy,
            matched_rule_id: None,
            field_mappings: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.matched_rule_id = Some(rule_id.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_mappings.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Clamps a confidence into `[0, 1]`; NaN and infinities become `0.0`.
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// The engine's output for one record: the record itself, one result per
/// category and the translated field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedComponent {
    pub record: ComponentRecord,
    pub symbol: MappingResult,
    pub footprint: MappingResult,
    pub category: MappingResult,
    pub fields: BTreeMap<String, String>,
}

impl MappedComponent {
    pub fn result(&self, category: RuleCategory) -> &MappingResult {
        match category {
            RuleCategory::Symbol => &self.symbol,
            RuleCategory::Footprint => &self.footprint,
            RuleCategory::Category => &self.category,
        }
    }

    /// Iterates over `(category, result)` in resolution order.
    pub fn results(&self) -> impl Iterator<Item = (RuleCategory, &MappingResult)> {
        RuleCategory::ALL
            .into_iter()
            .map(move |category| (category, self.result(category)))
    }

    /// Lowest confidence across the three categories.
    pub fn min_confidence(&self) -> f32 {
        self.results()
            .map(|(_, result)| result.confidence)
            .fold(1.0, f32::min)
    }
}
