//! Strategy registry.
//!
//! The registry maps strategy names to constructors. It is built and owned by
//! whoever assembles the engine, so tests and callers can inject their own
//! strategies next to the built-in ones.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::strategy::{
    CacheStrategy, FallbackStrategy, FuzzyStrategy, KeywordStrategy, MatchStrategy,
    PatternStrategy,
};

/// Builds a strategy from the engine configuration.
pub type StrategyConstructor = fn(&EngineConfig) -> Box<dyn MatchStrategy>;

/// Name of the terminal strategy. It is always appended by
/// [`StrategyRegistry::build`], whatever the configured order says.
pub const FALLBACK: &str = "fallback";

/// Named strategy constructors.
#[derive(Clone)]
pub struct StrategyRegistry {
    constructors: BTreeMap<String, StrategyConstructor>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Strategies instantiated in evaluation order, plus the fallback.
pub struct StrategyPipeline {
    pub strategies: Vec<Box<dyn MatchStrategy>>,
    pub fallback: FallbackStrategy,
}

impl StrategyPipeline {
    /// Names in evaluation order, fallback included.
    pub fn names(&self) -> Vec<&str> {
        self.strategies
            .iter()
            .map(|strategy| strategy.name())
            .chain(std::iter::once(FALLBACK))
            .collect()
    }
}

impl StrategyRegistry {
    /// A registry with no strategies. `fallback` is still accepted by
    /// [`build`](Self::build), which supplies it itself.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in strategies that precede the fallback.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("cache", |config| Box::new(CacheStrategy::new(config)));
        registry.register("pattern", |config| Box::new(PatternStrategy::new(config)));
        registry.register("fuzzy", |config| Box::new(FuzzyStrategy::new(config)));
        registry.register("keyword", |config| Box::new(KeywordStrategy::new(config)));
        registry
    }

    /// Registers a constructor, replacing any previous one with that name.
    pub fn register(&mut self, name: impl Into<String>, constructor: StrategyConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        name == FALLBACK || self.constructors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Instantiates the strategies named in `config.strategies`.
    ///
    /// Unknown names are rejected. Any `fallback` entry is dropped from the
    /// configured order and the fallback is always placed last, exactly once.
    pub fn build(&self, config: &EngineConfig) -> Result<StrategyPipeline> {
        let mut strategies: Vec<Box<dyn MatchStrategy>> = Vec::new();
        for name in &config.strategies {
            let name = name.trim();
            if name == FALLBACK {
                continue;
            }
            let constructor =
                self.constructors
                    .get(name)
                    .ok_or_else(|| EngineError::UnknownStrategy {
                        name: name.to_string(),
                        registered: self.names().collect::<Vec<_>>().join(", "),
                    })?;
            strategies.push(constructor(config));
        }
        let pipeline = StrategyPipeline {
            strategies,
            fallback: FallbackStrategy::new(config),
        };
        debug!(order = ?pipeline.names(), "built strategy pipeline");
        Ok(pipeline)
    }
}
