use thiserror::Error;

use crate::issue::IssueKind;
use crate::rule::RuleCategory;

/// Fatal problems found while loading rule configuration.
///
/// `rule` is the declared rule id, or the 1-based position in its category
/// list when the rule has no id.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuleValidationError {
    #[error("{category} rule {rule} has an empty pattern")]
    EmptyPattern { category: RuleCategory, rule: String },

    #[error("{category} rule {rule} ('{pattern}') has an empty target")]
    EmptyTarget {
        category: RuleCategory,
        rule: String,
        pattern: String,
    },

    #[error("{category} rule {rule} ('{pattern}') has confidence '{raw}', expected a number in [0, 1]")]
    InvalidConfidence {
        category: RuleCategory,
        rule: String,
        pattern: String,
        raw: String,
    },

    #[error("{category} rules have no universal '*' entry")]
    MissingUniversalRule { category: RuleCategory },

    #[error("{category} rule id '{rule}' is declared more than once")]
    DuplicateRuleId { category: RuleCategory, rule: String },
}

impl RuleValidationError {
    pub fn category(&self) -> RuleCategory {
        match self {
            Self::EmptyPattern { category, .. }
            | Self::EmptyTarget { category, .. }
            | Self::InvalidConfidence { category, .. }
            | Self::MissingUniversalRule { category }
            | Self::DuplicateRuleId { category, .. } => *category,
        }
    }

    /// The offending rule, if the error concerns a single rule.
    pub fn rule(&self) -> Option<&str> {
        match self {
            Self::EmptyPattern { rule, .. }
            | Self::EmptyTarget { rule, .. }
            | Self::InvalidConfidence { rule, .. }
            | Self::DuplicateRuleId { rule, .. } => Some(rule),
            Self::MissingUniversalRule { .. } => None,
        }
    }
}

/// Non-fatal failure while resolving one category of one record.
///
/// The pipeline never propagates these: it falls back and attaches the
/// message to the result's warnings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MatchingError {
    #[error("record has no {category} identifier (looked in: {fields})")]
    MissingIdentifier {
        category: RuleCategory,
        fields: String,
    },

    #[error("{strategy} strategy failed for {category}: {message}")]
    StrategyFailed {
        category: RuleCategory,
        strategy: String,
        message: String,
    },
}

impl MatchingError {
    pub fn category(&self) -> RuleCategory {
        match self {
            Self::MissingIdentifier { category, .. } | Self::StrategyFailed { category, .. } => {
                *category
            }
        }
    }

    pub fn kind(&self) -> IssueKind {
        match self {
            Self::MissingIdentifier { .. } => IssueKind::MissingIdentifier,
            Self::StrategyFailed { .. } => IssueKind::StrategyFailed,
        }
    }
}
