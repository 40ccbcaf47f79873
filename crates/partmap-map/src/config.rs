//! Engine configuration.

use partmap_model::RuleCategory;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::score::ConfidenceThresholds;

/// Default strategy order.
pub const DEFAULT_STRATEGIES: [&str; 5] = ["cache", "pattern", "fuzzy", "keyword", "fallback"];

/// Tuning knobs for the matcher pipeline and batch runner.
///
/// Every field has a default, so a partial JSON document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum confidence an intermediate strategy must reach to be accepted.
    pub min_acceptance: f32,
    /// Minimum fuzzy similarity for a catalog hit.
    pub fuzzy_threshold: f32,
    /// Multiplier applied to rule confidence by keyword matching.
    pub semantic_discount: f32,
    /// Confidence of the universal fallback result.
    pub fallback_confidence: f32,
    /// Confidence override for exact-literal pattern hits. When unset, exact
    /// hits receive the highest confidence among all satisfied rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_match_confidence: Option<f32>,
    /// Discount applied to results seeded from a cache snapshot.
    pub cache_staleness_factor: f32,
    pub thresholds: ConfidenceThresholds,
    /// Results at or below this confidence are logged at warn level.
    pub low_confidence_warning: f32,
    /// Strategy names in evaluation order.
    pub strategies: Vec<String>,
    /// Evaluate every strategy and pick the best instead of stopping at the
    /// first accepted result.
    pub speculative: bool,
    /// Worker count for batches; `None` uses the available parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    pub fields: FieldMapperConfig,
    pub record_fields: RecordFields,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_acceptance: 0.5,
            fuzzy_threshold: 0.7,
            semantic_discount: 0.8,
            fallback_confidence: 0.1,
            exact_match_confidence: None,
            cache_staleness_factor: 0.95,
            thresholds: ConfidenceThresholds::default(),
            low_confidence_warning: 0.3,
            strategies: DEFAULT_STRATEGIES.iter().map(ToString::to_string).collect(),
            speculative: false,
            workers: None,
            fields: FieldMapperConfig::default(),
            record_fields: RecordFields::default(),
        }
    }
}

impl EngineConfig {
    /// Checks that every ratio is inside `[0, 1]` and that the remaining
    /// settings are usable.
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("min_acceptance", self.min_acceptance),
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("semantic_discount", self.semantic_discount),
            ("fallback_confidence", self.fallback_confidence),
            ("cache_staleness_factor", self.cache_staleness_factor),
            ("thresholds.high", self.thresholds.high),
            ("thresholds.medium", self.thresholds.medium),
            ("low_confidence_warning", self.low_confidence_warning),
        ];
        for (setting, value) in ratios {
            check_ratio(setting, value)?;
        }
        if let Some(value) = self.exact_match_confidence {
            check_ratio("exact_match_confidence", value)?;
        }
        if self.thresholds.medium > self.thresholds.high {
            return Err(EngineError::invalid(
                "thresholds",
                format!(
                    "medium ({}) is above high ({})",
                    self.thresholds.medium, self.thresholds.high
                ),
            ));
        }
        if self.workers == Some(0) {
            return Err(EngineError::invalid("workers", "must be at least 1"));
        }
        if self.fields.max_length == 0 {
            return Err(EngineError::invalid("fields.max_length", "must be at least 1"));
        }
        for category in RuleCategory::ALL {
            if self.record_fields.identifiers(category).is_empty() {
                return Err(EngineError::invalid(
                    "record_fields",
                    format!("no identifier fields for {category}"),
                ));
            }
        }
        Ok(())
    }

    /// Resolved batch worker count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

fn check_ratio(setting: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::invalid(
            setting,
            format!("{value} is outside [0, 1]"),
        ))
    }
}

/// Value sanitation settings for the field mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapperConfig {
    /// Maximum length of a sanitized value in characters, marker included.
    pub max_length: usize,
    pub truncation_marker: String,
}

impl Default for FieldMapperConfig {
    fn default() -> Self {
        Self {
            max_length: 255,
            truncation_marker: "...".to_string(),
        }
    }
}

/// Which record fields feed each category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFields {
    pub symbol: Vec<String>,
    pub footprint: Vec<String>,
    pub category: Vec<String>,
    pub description: Vec<String>,
    pub value: Vec<String>,
    pub package: Vec<String>,
}

impl Default for RecordFields {
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(ToString::to_string).collect()
        }
        Self {
            symbol: names(&["Symbol", "Library Ref", "LibRef"]),
            footprint: names(&["Footprint", "Footprint Ref", "PCB Footprint"]),
            category: names(&["Category", "Name", "Library Ref", "Symbol"]),
            description: names(&["Description", "Comment"]),
            value: names(&["Value"]),
            package: names(&["Package"]),
        }
    }
}

impl RecordFields {
    /// Identifier fields for `category`, in lookup order.
    pub fn identifiers(&self, category: RuleCategory) -> &[String] {
        match category {
            RuleCategory::Symbol => &self.symbol,
            RuleCategory::Footprint => &self.footprint,
            RuleCategory::Category => &self.category,
        }
    }
}
