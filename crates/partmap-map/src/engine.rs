//! Matcher pipeline and engine facade.
//!
//! [`Matcher`] resolves one category of one record by walking the configured
//! strategies; [`MappingEngine`] runs it for all three categories and adds
//! the translated field set.

use std::sync::Arc;

use partmap_model::{
    ComponentRecord, IssueKind, MappedComponent, MappingResult, RuleCategory, Strategy,
};
use tracing::{debug, trace, warn};

use crate::cache::{ResultCache, SharedCache};
use crate::catalog::SimilarityCatalog;
use crate::config::{EngineConfig, RecordFields};
use crate::error::Result;
use crate::fields::{FieldMapper, FieldTable};
use crate::registry::{StrategyPipeline, StrategyRegistry};
use crate::rules::RuleSet;
use crate::score::{ConfidenceLevel, ConfidenceScorer, pick_best};
use crate::strategy::MatchContext;

/// Outcome of one resolution, with the bookkeeping needed for run summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub result: MappingResult,
    /// The result came from the cache strategy.
    pub cache_hit: bool,
    /// Non-fatal events observed while resolving.
    pub issues: Vec<IssueKind>,
}

/// Category-parametrised matcher over an ordered strategy list.
pub struct Matcher {
    rules: RuleSet,
    catalog: SimilarityCatalog,
    cache: Arc<dyn ResultCache>,
    pipeline: StrategyPipeline,
    record_fields: RecordFields,
    scorer: ConfidenceScorer,
    min_acceptance: f32,
    low_confidence_warning: f32,
    speculative: bool,
}

impl Matcher {
    pub fn new(
        rules: RuleSet,
        catalog: SimilarityCatalog,
        config: &EngineConfig,
        registry: &StrategyRegistry,
        cache: Arc<dyn ResultCache>,
    ) -> Result<Self> {
        config.validate()?;
        catalog.validate()?;
        let pipeline = registry.build(config)?;
        Ok(Self {
            rules,
            catalog,
            cache,
            pipeline,
            record_fields: config.record_fields.clone(),
            scorer: ConfidenceScorer::new(config),
            min_acceptance: config.min_acceptance,
            low_confidence_warning: config.low_confidence_warning,
            speculative: config.speculative,
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn catalog(&self) -> &SimilarityCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &dyn ResultCache {
        self.cache.as_ref()
    }

    pub fn scorer(&self) -> &ConfidenceScorer {
        &self.scorer
    }

    /// Strategy names in evaluation order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.pipeline.names()
    }

    /// Resolves one category of `record`. Always returns a result.
    pub fn resolve(&self, category: RuleCategory, record: &ComponentRecord) -> MappingResult {
        self.resolve_traced(category, record).result
    }

    /// Like [`resolve`](Self::resolve), also reporting cache use and issues.
    pub fn resolve_traced(&self, category: RuleCategory, record: &ComponentRecord) -> Resolution {
        let ctx = MatchContext::new(
            category,
            record,
            &self.record_fields,
            &self.rules,
            &self.catalog,
            self.cache.as_ref(),
        );

        let mut chosen: Option<MappingResult> = None;
        let mut accepted: Vec<MappingResult> = Vec::new();
        let mut cache_hit = false;

        for strategy in &self.pipeline.strategies {
            match strategy.attempt(&ctx) {
                Ok(Some(result)) if strategy.kind() == Strategy::Cache => {
                    trace!(%category, strategy = strategy.name(), "cache hit");
                    cache_hit = true;
                    chosen = Some(result);
                    break;
                }
                Ok(Some(result)) if result.confidence >= self.min_acceptance => {
                    debug!(
                        %category,
                        strategy = strategy.name(),
                        target = %result.target,
                        confidence = result.confidence,
                        "strategy accepted"
                    );
                    if self.speculative {
                        accepted.push(result);
                    } else {
                        chosen = Some(result);
                        break;
                    }
                }
                Ok(Some(result)) => {
                    debug!(
                        %category,
                        strategy = strategy.name(),
                        confidence = result.confidence,
                        min_acceptance = self.min_acceptance,
                        "strategy result below acceptance"
                    );
                }
                Ok(None) => {
                    trace!(%category, strategy = strategy.name(), "no match");
                }
                Err(error) => {
                    warn!(%category, strategy = strategy.name(), %error, "matching failed; using fallback");
                    let result = self
                        .pipeline
                        .fallback
                        .resolve(&ctx)
                        .with_warning(error.to_string());
                    return Resolution {
                        result,
                        cache_hit: false,
                        issues: vec![error.kind()],
                    };
                }
            }
        }

        if chosen.is_none() && self.speculative {
            chosen = pick_best(accepted);
        }

        let result = match chosen {
            Some(result) if cache_hit => result,
            Some(result) => self.remember(&ctx, result),
            None => {
                let result = self.pipeline.fallback.resolve(&ctx);
                self.remember(&ctx, result)
            }
        };

        let mut issues = self.issues_for(&result);
        let result = match ctx.require_identifier() {
            Err(error) if result.strategy == Strategy::Fallback => {
                debug!(%category, %error, "no identifier and no other evidence");
                issues.push(error.kind());
                result.with_warning(error.to_string())
            }
            _ => result,
        };
        self.log_outcome(category, &result);
        Resolution {
            result,
            cache_hit,
            issues,
        }
    }

    fn remember(&self, ctx: &MatchContext<'_>, result: MappingResult) -> MappingResult {
        match ctx.cache_key() {
            Some(key) => self.cache.put_if_absent(ctx.category, &key, result),
            None => result,
        }
    }

    fn issues_for(&self, result: &MappingResult) -> Vec<IssueKind> {
        match result.strategy {
            Strategy::Fallback => vec![IssueKind::FallbackUsed],
            Strategy::Cache => vec![IssueKind::StaleCacheReuse],
            _ if result.confidence <= self.low_confidence_warning => {
                vec![IssueKind::LowConfidence]
            }
            _ => Vec::new(),
        }
    }

    fn log_outcome(&self, category: RuleCategory, result: &MappingResult) {
        if result.confidence <= self.low_confidence_warning {
            warn!(
                %category,
                strategy = %result.strategy,
                target = %result.target,
                confidence = result.confidence,
                "low confidence mapping"
            );
        } else if self.scorer.classify(result.confidence) == ConfidenceLevel::High {
            debug!(
                %category,
                strategy = %result.strategy,
                target = %result.target,
                confidence = result.confidence,
                "high confidence mapping"
            );
        }
    }
}

/// A mapped record plus the issues raised while resolving it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub component: MappedComponent,
    pub issues: Vec<(RuleCategory, IssueKind)>,
}

/// The mapping engine: matcher plus field mapper.
pub struct MappingEngine {
    matcher: Matcher,
    fields: FieldMapper,
    config: EngineConfig,
}

impl MappingEngine {
    pub fn new(
        rules: RuleSet,
        catalog: SimilarityCatalog,
        field_table: FieldTable,
        config: EngineConfig,
        registry: &StrategyRegistry,
        cache: Arc<dyn ResultCache>,
    ) -> Result<Self> {
        field_table.validate()?;
        let matcher = Matcher::new(rules, catalog, &config, registry, cache)?;
        let fields = FieldMapper::new(field_table, config.fields.clone());
        Ok(Self {
            matcher,
            fields,
            config,
        })
    }

    /// Engine with the default catalog, field table and strategies, and a
    /// fresh cache.
    pub fn with_rules(rules: RuleSet, config: EngineConfig) -> Result<Self> {
        Self::new(
            rules,
            SimilarityCatalog::default(),
            FieldTable::default(),
            config,
            &StrategyRegistry::builtin(),
            Arc::new(SharedCache::new()),
        )
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn field_mapper(&self) -> &FieldMapper {
        &self.fields
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolves every category and translates the record's fields.
    pub fn map_record(&self, record: &ComponentRecord) -> MappedComponent {
        self.map_record_traced(record).component
    }

    pub fn map_record_traced(&self, record: &ComponentRecord) -> RecordOutcome {
        let mut issues = Vec::new();
        let [symbol, footprint, category] = RuleCategory::ALL.map(|category| {
            let resolution = self.matcher.resolve_traced(category, record);
            issues.extend(resolution.issues.into_iter().map(|kind| (category, kind)));
            resolution.result
        });
        RecordOutcome {
            component: MappedComponent {
                record: record.clone(),
                symbol,
                footprint,
                category,
                fields: self.fields.translate(record),
            },
            issues,
        }
    }
}
