//! Match strategies and the per-attempt context they read from.
//!
//! A strategy inspects one category of one record and either proposes a
//! [`MappingResult`], declines (`Ok(None)`), or reports a [`MatchingError`].
//! Strategies never decide acceptance; the matcher compares proposals with
//! the acceptance threshold and falls back when nothing qualifies.

use partmap_model::{
    ComponentRecord, MappingResult, MatchingError, RuleCategory, RuleKind, Strategy,
};

use crate::cache::ResultCache;
use crate::catalog::SimilarityCatalog;
use crate::config::{EngineConfig, RecordFields};
use crate::package::first_package_code;
use crate::rules::{RuleSet, wildcard_match};
use crate::score::ConfidenceScorer;
use crate::utils::{cache_key, normalize_text};

/// Name under which an extracted package code appears in field mappings.
pub const PACKAGE_CODE_FIELD: &str = "package_code";

/// A record field selected for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldValue<'a> {
    pub name: &'a str,
    /// Trimmed, never empty.
    pub value: &'a str,
}

/// Everything a strategy may consult while resolving one category of one
/// record.
pub struct MatchContext<'a> {
    pub category: RuleCategory,
    pub record: &'a ComponentRecord,
    pub identifier: Option<FieldValue<'a>>,
    pub description: Option<FieldValue<'a>>,
    pub value: Option<FieldValue<'a>>,
    /// Package code extracted for footprint resolution.
    pub package_code: Option<String>,
    pub rules: &'a RuleSet,
    pub catalog: &'a SimilarityCatalog,
    pub cache: &'a dyn ResultCache,
    identifier_fields: &'a [String],
}

impl<'a> MatchContext<'a> {
    pub fn new(
        category: RuleCategory,
        record: &'a ComponentRecord,
        fields: &'a RecordFields,
        rules: &'a RuleSet,
        catalog: &'a SimilarityCatalog,
        cache: &'a dyn ResultCache,
    ) -> Self {
        let select = |names: &'a [String]| {
            record
                .first_non_empty(names)
                .map(|(name, value)| FieldValue { name, value })
        };
        let identifier_fields = fields.identifiers(category);
        let identifier = select(identifier_fields);
        let description = select(&fields.description);
        let value = select(&fields.value);

        let package_code = if category == RuleCategory::Footprint {
            let package = select(&fields.package);
            let texts: Vec<&str> = [identifier, package, description]
                .into_iter()
                .flatten()
                .map(|field| field.value)
                .collect();
            first_package_code(&texts)
        } else {
            None
        };

        Self {
            category,
            record,
            identifier,
            description,
            value,
            package_code,
            rules,
            catalog,
            cache,
            identifier_fields,
        }
    }

    /// The identifier, or the error reported when a record falls back
    /// without one.
    pub fn require_identifier(&self) -> Result<FieldValue<'a>, MatchingError> {
        self.identifier
            .ok_or_else(|| MatchingError::MissingIdentifier {
                category: self.category,
                fields: self.identifier_fields.join(", "),
            })
    }

    /// Candidate strings for pattern lookup, in priority order.
    pub fn candidates(&self) -> Vec<FieldValue<'_>> {
        let mut candidates: Vec<FieldValue<'_>> = [self.identifier, self.description, self.value]
            .into_iter()
            .flatten()
            .collect();
        if let Some(code) = &self.package_code {
            candidates.push(FieldValue {
                name: PACKAGE_CODE_FIELD,
                value: code,
            });
        }
        candidates
    }

    /// Cache key for this record, `None` without an identifier.
    ///
    /// The identifier is followed by the description, value and package code
    /// slots. Matching ignores case and surrounding whitespace, so the key
    /// does too.
    pub fn cache_key(&self) -> Option<String> {
        let identifier = self.identifier?;
        let description = self.description.map_or("", |field| field.value);
        let value = self.value.map_or("", |field| field.value);
        let code = self.package_code.as_deref().unwrap_or_default();
        Some(cache_key(identifier.value, &[description, value, code]))
    }
}

/// One interchangeable step of the matcher pipeline.
pub trait MatchStrategy: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Strategy recorded on the results this strategy produces.
    fn kind(&self) -> Strategy;

    fn attempt(&self, ctx: &MatchContext<'_>) -> Result<Option<MappingResult>, MatchingError>;
}

/// Returns results memoised earlier in the run, unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStrategy;

impl CacheStrategy {
    pub fn new(_config: &EngineConfig) -> Self {
        Self
    }
}

impl MatchStrategy for CacheStrategy {
    fn name(&self) -> &str {
        "cache"
    }

    fn kind(&self) -> Strategy {
        Strategy::Cache
    }

    fn attempt(&self, ctx: &MatchContext<'_>) -> Result<Option<MappingResult>, MatchingError> {
        Ok(ctx
            .cache_key()
            .and_then(|key| ctx.cache.get(ctx.category, &key)))
    }
}

/// Most specific satisfied rule wins.
///
/// Universal rules are left to the fallback.
#[derive(Debug, Clone, Copy)]
pub struct PatternStrategy {
    scorer: ConfidenceScorer,
    exact_match_confidence: Option<f32>,
}

impl PatternStrategy {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scorer: ConfidenceScorer::new(config),
            exact_match_confidence: config.exact_match_confidence,
        }
    }
}

impl MatchStrategy for PatternStrategy {
    fn name(&self) -> &str {
        "pattern"
    }

    fn kind(&self) -> Strategy {
        Strategy::Pattern
    }

    fn attempt(&self, ctx: &MatchContext<'_>) -> Result<Option<MappingResult>, MatchingError> {
        let candidates = ctx.candidates();
        if candidates.is_empty() {
            return Ok(None);
        }
        let texts: Vec<&str> = candidates.iter().map(|field| field.value).collect();
        let satisfied: Vec<_> = ctx
            .rules
            .lookup(ctx.category, &texts)
            .into_iter()
            .filter(|rule| !rule.is_universal())
            .collect();
        let Some(winner) = satisfied.first() else {
            return Ok(None);
        };

        let rule_confidence = match winner.kind {
            RuleKind::Exact => self.exact_match_confidence.unwrap_or_else(|| {
                satisfied
                    .iter()
                    .map(|rule| rule.confidence)
                    .fold(winner.confidence, f32::max)
            }),
            RuleKind::Wildcard => winner.confidence,
        };
        let confidence = self.scorer.score(Strategy::Pattern, rule_confidence, 0.0);

        let mut result = MappingResult::new(winner.target.clone(), confidence, Strategy::Pattern)
            .with_rule(winner.id.clone());
        if let Some(field) = candidates
            .iter()
            .find(|field| wildcard_match(&winner.pattern, field.value))
        {
            result = result.with_field(field.name, field.value);
        }
        Ok(Some(result))
    }
}

/// Nearest canonical name from the similarity catalog.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyStrategy {
    scorer: ConfidenceScorer,
    threshold: f32,
}

impl FuzzyStrategy {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scorer: ConfidenceScorer::new(config),
            threshold: config.fuzzy_threshold,
        }
    }
}

impl MatchStrategy for FuzzyStrategy {
    fn name(&self) -> &str {
        "fuzzy"
    }

    fn kind(&self) -> Strategy {
        Strategy::Fuzzy
    }

    fn attempt(&self, ctx: &MatchContext<'_>) -> Result<Option<MappingResult>, MatchingError> {
        let Some(identifier) = ctx.identifier else {
            return Ok(None);
        };
        let Some(hit) = ctx.catalog.best_match(ctx.category, identifier.value) else {
            return Ok(None);
        };
        if hit.similarity < self.threshold {
            return Ok(None);
        }
        let confidence = self.scorer.score(Strategy::Fuzzy, 0.0, hit.similarity);
        Ok(Some(
            MappingResult::new(hit.name, confidence, Strategy::Fuzzy)
                .with_field(identifier.name, identifier.value),
        ))
    }
}

/// Rule keywords found in the description or value text.
#[derive(Debug, Clone, Copy)]
pub struct KeywordStrategy {
    scorer: ConfidenceScorer,
}

impl KeywordStrategy {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scorer: ConfidenceScorer::new(config),
        }
    }
}

impl MatchStrategy for KeywordStrategy {
    fn name(&self) -> &str {
        "keyword"
    }

    fn kind(&self) -> Strategy {
        Strategy::Keyword
    }

    fn attempt(&self, ctx: &MatchContext<'_>) -> Result<Option<MappingResult>, MatchingError> {
        let texts: Vec<(FieldValue<'_>, String)> = [ctx.description, ctx.value]
            .into_iter()
            .flatten()
            .map(|field| (field, normalize_text(field.value)))
            .collect();
        if texts.is_empty() {
            return Ok(None);
        }

        for rule in ctx.rules.rules(ctx.category) {
            let hit = rule.keywords.iter().find_map(|keyword| {
                texts
                    .iter()
                    .find(|(_, text)| text.contains(keyword.as_str()))
                    .map(|(field, _)| *field)
            });
            if let Some(field) = hit {
                let confidence = self
                    .scorer
                    .score(Strategy::Keyword, rule.confidence, 0.0);
                return Ok(Some(
                    MappingResult::new(rule.target.clone(), confidence, Strategy::Keyword)
                        .with_rule(rule.id.clone())
                        .with_field(field.name, field.value),
                ));
            }
        }
        Ok(None)
    }
}

/// The universal rule's target at the fixed fallback confidence.
#[derive(Debug, Clone, Copy)]
pub struct FallbackStrategy {
    scorer: ConfidenceScorer,
}

impl FallbackStrategy {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scorer: ConfidenceScorer::new(config),
        }
    }

    /// Always succeeds; every category has a universal rule.
    pub fn resolve(&self, ctx: &MatchContext<'_>) -> MappingResult {
        let rule = ctx.rules.universal(ctx.category);
        let confidence = self.scorer.score(Strategy::Fallback, rule.confidence, 0.0);
        MappingResult::new(rule.target.clone(), confidence, Strategy::Fallback)
            .with_rule(rule.id.clone())
    }
}
