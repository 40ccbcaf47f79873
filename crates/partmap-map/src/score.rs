//! Confidence scoring and classification.
//!
//! The scorer turns the raw evidence of a strategy (a rule's declared
//! confidence or a similarity ratio) into a result confidence, classifies
//! confidences for reporting, and orders competing results.

use std::cmp::Ordering;

use partmap_model::{MappingResult, Strategy, clamp_confidence};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Confidence level categories for mapping quality assessment.
///
/// These levels are used for reporting only; they never change which target
/// the engine picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    /// Below the medium threshold; the mapping needs manual verification.
    Low,
    /// Reasonable but should be reviewed.
    Medium,
    /// Near-certain.
    High,
}

impl ConfidenceLevel {
    pub const ALL: [ConfidenceLevel; 3] = [Self::High, Self::Medium, Self::Low];

    /// Returns a human-readable description of the confidence level.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::High => "high confidence - likely correct",
            Self::Medium => "medium confidence - should review",
            Self::Low => "low confidence - needs verification",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Configurable thresholds for categorizing mapping confidence.
///
/// - At or above `high`: [`ConfidenceLevel::High`]
/// - `medium` to `high`: [`ConfidenceLevel::Medium`]
/// - Below `medium`: [`ConfidenceLevel::Low`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    /// Minimum confidence for high-quality matches (default: 0.80).
    pub high: f32,
    /// Minimum confidence for medium-quality matches (default: 0.50).
    pub medium: f32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.80,
            medium: 0.50,
        }
    }
}

impl ConfidenceThresholds {
    /// Creates thresholds with strict boundaries for reviewed migrations.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            high: 0.90,
            medium: 0.70,
        }
    }

    /// Creates thresholds with relaxed boundaries for exploratory runs.
    #[must_use]
    pub fn relaxed() -> Self {
        Self {
            high: 0.70,
            medium: 0.40,
        }
    }

    /// Categorizes a confidence score into a confidence level.
    #[must_use]
    pub fn categorize(&self, confidence: f32) -> ConfidenceLevel {
        if confidence >= self.high {
            ConfidenceLevel::High
        } else if confidence >= self.medium {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Stateless per-strategy confidence formulas.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    semantic_discount: f32,
    fallback_confidence: f32,
    cache_staleness_factor: f32,
    thresholds: ConfidenceThresholds,
}

impl ConfidenceScorer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            semantic_discount: config.semantic_discount,
            fallback_confidence: config.fallback_confidence,
            cache_staleness_factor: config.cache_staleness_factor,
            thresholds: config.thresholds,
        }
    }

    /// Computes the confidence for a result produced by `strategy`.
    ///
    /// `rule_confidence` is the declared confidence of the rule involved (if
    /// any) and `similarity` the fuzzy ratio (if any); each strategy reads only
    /// the input its formula needs.
    pub fn score(&self, strategy: Strategy, rule_confidence: f32, similarity: f32) -> f32 {
        let raw = match strategy {
            Strategy::Pattern => rule_confidence,
            Strategy::Fuzzy => similarity,
            Strategy::Keyword => rule_confidence * self.semantic_discount,
            Strategy::Cache => rule_confidence * self.cache_staleness_factor,
            Strategy::Fallback => self.fallback_confidence,
        };
        clamp_confidence(raw)
    }

    /// Classifies a confidence for reporting.
    pub fn classify(&self, confidence: f32) -> ConfidenceLevel {
        self.thresholds.categorize(confidence)
    }

    pub fn thresholds(&self) -> &ConfidenceThresholds {
        &self.thresholds
    }
}

/// Tie-break rank of a strategy; higher wins when confidences are equal.
pub fn strategy_rank(strategy: Strategy) -> u8 {
    match strategy {
        Strategy::Pattern => 4,
        Strategy::Fuzzy => 3,
        Strategy::Keyword => 2,
        Strategy::Cache => 1,
        Strategy::Fallback => 0,
    }
}

/// Orders two candidate results; `Ordering::Greater` means `a` should win.
///
/// Higher confidence wins; equal confidences fall back to strategy rank.
pub fn compare_results(a: &MappingResult, b: &MappingResult) -> Ordering {
    a.confidence
        .partial_cmp(&b.confidence)
        .unwrap_or(Ordering::Equal)
        .then_with(|| strategy_rank(a.strategy).cmp(&strategy_rank(b.strategy)))
}

/// Picks the winning result among candidates. On a complete tie the earlier
/// candidate is kept.
pub fn pick_best<I>(candidates: I) -> Option<MappingResult>
where
    I: IntoIterator<Item = MappingResult>,
{
    let mut best: Option<MappingResult> = None;
    for candidate in candidates {
        match &best {
            Some(current) if compare_results(&candidate, current) != Ordering::Greater => {}
            _ => best = Some(candidate),
        }
    }
    best
}
