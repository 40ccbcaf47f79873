//! Component mapping engine.
//!
//! Resolves the symbol, footprint and category reference of source component
//! records through an ordered list of strategies:
//!
//! 1. **cache**: results computed earlier in the run
//! 2. **pattern**: wildcard rules, most specific first
//! 3. **fuzzy**: normalised edit distance against a catalog of canonical names
//! 4. **keyword**: rule keywords found in the description or value
//! 5. **fallback**: the universal `*` rule at a fixed low confidence
//!
//! Every record gets a result for every category; confidence is always in
//! `[0, 1]`.
//!
//! # Example
//!
//! ```
//! use partmap_map::{EngineConfig, MappingEngine, RuleSet};
//! use partmap_model::{ComponentRecord, RuleCategory, RuleConfig, RuleEntry};
//!
//! let rules = RuleSet::load(&RuleConfig {
//!     symbol: vec![
//!         RuleEntry::new("RES*", "Device:R"),
//!         RuleEntry::new("*", "Device:Unknown"),
//!     ],
//!     footprint: vec![RuleEntry::new("*", "Unknown:Footprint")],
//!     category: vec![RuleEntry::new("*", "Uncategorized")],
//! })
//! .unwrap();
//! let engine = MappingEngine::with_rules(rules, EngineConfig::default()).unwrap();
//! let record = ComponentRecord::new().with_field("Symbol", "RES10K");
//! let mapped = engine.map_record(&record);
//! assert_eq!(mapped.result(RuleCategory::Symbol).target, "Device:R");
//! ```

pub mod batch;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod fields;
pub mod package;
pub mod registry;
pub mod repository;
pub mod rules;
pub mod score;
pub mod strategy;
mod utils;

pub use batch::{BatchReport, BatchRunner, CancelFlag, CategorySummary, RunSummary};
pub use cache::{CacheStats, ResultCache, SharedCache};
pub use catalog::{CatalogMatch, SimilarityCatalog, similarity};
pub use config::{DEFAULT_STRATEGIES, EngineConfig, FieldMapperConfig, RecordFields};
pub use engine::{MappingEngine, Matcher, RecordOutcome, Resolution};
pub use error::{EngineError, RepositoryError};
pub use fields::{FieldMapper, FieldRename, FieldTable};
pub use package::{extract_package_code, first_package_code};
pub use registry::{StrategyConstructor, StrategyPipeline, StrategyRegistry};
pub use repository::{CacheRepository, CacheSnapshot, SNAPSHOT_VERSION, SnapshotEntry};
pub use rules::{RuleSet, wildcard_match};
pub use score::{
    ConfidenceLevel, ConfidenceScorer, ConfidenceThresholds, compare_results, pick_best,
    strategy_rank,
};
pub use strategy::{
    CacheStrategy, FallbackStrategy, FieldValue, FuzzyStrategy, KeywordStrategy, MatchContext,
    MatchStrategy, PACKAGE_CODE_FIELD, PatternStrategy,
};
pub use utils::{cache_key, normalize_key, normalize_text};
