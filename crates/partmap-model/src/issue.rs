//! Non-fatal run events, counted for end-of-run summaries.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Info,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of non-fatal event observed while mapping a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The record had no value in any identifier field of a category.
    MissingIdentifier,
    /// A strategy reported an error; the fallback result was used.
    StrategyFailed,
    /// No strategy met the acceptance threshold.
    FallbackUsed,
    /// The accepted result sits at or below the low-confidence warning line.
    LowConfidence,
    /// The result was seeded from a cache snapshot of an earlier run.
    StaleCacheReuse,
}

impl IssueKind {
    pub fn severity(&self) -> IssueSeverity {
        match self {
            Self::MissingIdentifier | Self::StrategyFailed | Self::FallbackUsed => {
                IssueSeverity::Warning
            }
            Self::LowConfidence | Self::StaleCacheReuse => IssueSeverity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingIdentifier => "missing_identifier",
            Self::StrategyFailed => "strategy_failed",
            Self::FallbackUsed => "fallback_used",
            Self::LowConfidence => "low_confidence",
            Self::StaleCacheReuse => "stale_cache_reuse",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
