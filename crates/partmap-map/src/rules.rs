//! Rule store: validated, specificity-ordered mapping rules.

use std::collections::{BTreeSet, HashSet};

use partmap_model::{
    DEFAULT_RULE_CONFIDENCE, MappingRule, RuleCategory, RuleConfig, RuleEntry, RuleKind,
    RuleValidationError, WILDCARD,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::utils::normalize_text;

/// Immutable rules for all three categories.
///
/// Each category's rules are sorted most specific first; equal specificity
/// keeps declaration order, so universal rules always come last.
#[derive(Debug, Clone)]
pub struct RuleSet {
    symbol: CategoryRules,
    footprint: CategoryRules,
    category: CategoryRules,
}

#[derive(Debug, Clone)]
struct CategoryRules {
    rules: Vec<MappingRule>,
    /// Index into `rules` of the first declared universal rule.
    universal: usize,
}

impl RuleSet {
    /// Validates a rule configuration and builds the rule set.
    ///
    /// Any invalid entry aborts the load; no partial rule set is produced.
    pub fn load(config: &RuleConfig) -> Result<Self, RuleValidationError> {
        let rule_set = Self {
            symbol: load_category(RuleCategory::Symbol, config.entries(RuleCategory::Symbol))?,
            footprint: load_category(
                RuleCategory::Footprint,
                config.entries(RuleCategory::Footprint),
            )?,
            category: load_category(
                RuleCategory::Category,
                config.entries(RuleCategory::Category),
            )?,
        };
        info!(
            symbol_rules = rule_set.symbol.rules.len(),
            footprint_rules = rule_set.footprint.rules.len(),
            category_rules = rule_set.category.rules.len(),
            "loaded rule set"
        );
        Ok(rule_set)
    }

    fn store(&self, category: RuleCategory) -> &CategoryRules {
        match category {
            RuleCategory::Symbol => &self.symbol,
            RuleCategory::Footprint => &self.footprint,
            RuleCategory::Category => &self.category,
        }
    }

    /// All rules of a category in evaluation order.
    pub fn rules(&self, category: RuleCategory) -> &[MappingRule] {
        &self.store(category).rules
    }

    /// The category's fallback rule.
    pub fn universal(&self, category: RuleCategory) -> &MappingRule {
        let store = self.store(category);
        &store.rules[store.universal]
    }

    /// Rules whose pattern matches at least one candidate, most specific
    /// first. Blank candidates are ignored.
    pub fn lookup<S>(&self, category: RuleCategory, candidates: &[S]) -> Vec<&MappingRule>
    where
        S: AsRef<str>,
    {
        let candidates: Vec<&str> = candidates
            .iter()
            .map(|candidate| candidate.as_ref().trim())
            .filter(|candidate| !candidate.is_empty())
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }
        self.rules(category)
            .iter()
            .filter(|rule| {
                candidates
                    .iter()
                    .any(|candidate| wildcard_match(&rule.pattern, candidate))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        RuleCategory::ALL
            .iter()
            .map(|category| self.rules(*category).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// SHA-256 over the normalised rules, hex encoded.
    ///
    /// Two rule sets with the same fingerprint resolve every record the same
    /// way, which is what makes a persisted cache reusable.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for category in RuleCategory::ALL {
            for rule in self.rules(category) {
                hasher.update(category.as_str().as_bytes());
                for part in [rule.id.as_str(), rule.pattern.as_str(), rule.target.as_str()] {
                    hasher.update([0x1f]);
                    hasher.update(part.as_bytes());
                }
                hasher.update([0x1f]);
                hasher.update(rule.confidence.to_bits().to_le_bytes());
                for keyword in &rule.keywords {
                    hasher.update([0x1e]);
                    hasher.update(keyword.as_bytes());
                }
                hasher.update([b'\n']);
            }
        }
        hex::encode(hasher.finalize())
    }
}

fn load_category(
    category: RuleCategory,
    entries: &[RuleEntry],
) -> Result<CategoryRules, RuleValidationError> {
    let mut rules = Vec::with_capacity(entries.len());
    let mut seen_ids = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let rule = validate_entry(category, index + 1, entry)?;
        if !seen_ids.insert(rule.id.clone()) {
            return Err(RuleValidationError::DuplicateRuleId {
                category,
                rule: rule.id,
            });
        }
        rules.push(rule);
    }

    // Stable: equal specificity keeps declaration order.
    rules.sort_by(|a, b| b.specificity().cmp(&a.specificity()));

    let universal = rules
        .iter()
        .position(MappingRule::is_universal)
        .ok_or(RuleValidationError::MissingUniversalRule { category })?;

    debug!(%category, rules = rules.len(), "validated category rules");
    Ok(CategoryRules { rules, universal })
}

fn validate_entry(
    category: RuleCategory,
    position: usize,
    entry: &RuleEntry,
) -> Result<MappingRule, RuleValidationError> {
    let id = entry
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map_or_else(|| format!("{category}#{position}"), ToString::to_string);

    let pattern = entry.pattern.trim();
    if pattern.is_empty() {
        return Err(RuleValidationError::EmptyPattern { category, rule: id });
    }

    let target = entry.target.trim();
    if target.is_empty() {
        return Err(RuleValidationError::EmptyTarget {
            category,
            rule: id,
            pattern: pattern.to_string(),
        });
    }

    let confidence = match &entry.confidence {
        None => DEFAULT_RULE_CONFIDENCE,
        Some(raw) => raw
            .parse()
            .ok_or_else(|| RuleValidationError::InvalidConfidence {
                category,
                rule: id.clone(),
                pattern: pattern.to_string(),
                raw: raw.to_string(),
            })?,
    };

    let keywords: BTreeSet<String> = entry
        .keywords
        .iter()
        .map(|keyword| normalize_text(keyword))
        .filter(|keyword| !keyword.is_empty())
        .collect();

    Ok(MappingRule {
        id,
        pattern: pattern.to_string(),
        kind: RuleKind::of(pattern),
        target: target.to_string(),
        confidence,
        keywords,
    })
}

/// Matches `text` against a pattern where `*` stands for zero or more
/// characters. Both sides are trimmed and compared case-insensitively.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.trim().to_lowercase().chars().collect();
    let text: Vec<char> = text.trim().to_lowercase().chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == WILDCARD {
            star = Some(p);
            p += 1;
            resume = t;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some(star) = star {
            p = star + 1;
            resume += 1;
            t = resume;
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|ch| *ch == WILDCARD)
}
