pub mod error;
pub mod issue;
pub mod record;
pub mod result;
pub mod rule;

pub use error::{MatchingError, RuleValidationError};
pub use issue::{IssueKind, IssueSeverity};
pub use record::ComponentRecord;
pub use result::{MappedComponent, MappingResult, Strategy, clamp_confidence};
pub use rule::{
    DEFAULT_RULE_CONFIDENCE, MappingRule, RawConfidence, RuleCategory, RuleConfig, RuleEntry,
    RuleKind, WILDCARD, pattern_specificity,
};
