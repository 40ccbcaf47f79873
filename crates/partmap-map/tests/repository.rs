use std::fs;
use std::sync::Arc;

use partmap_map::{
    CacheRepository, CacheSnapshot, ConfidenceScorer, EngineConfig, FieldTable, MappingEngine,
    RepositoryError, ResultCache, RuleSet, SNAPSHOT_VERSION, SharedCache, SimilarityCatalog,
    StrategyRegistry,
};
use partmap_model::{ComponentRecord, IssueKind, RuleCategory, RuleConfig, RuleEntry, Strategy};
use tempfile::TempDir;

fn rule_config(confidence: f64) -> RuleConfig {
    RuleConfig {
        symbol: vec![
            RuleEntry::new("R*", "Device:R").with_confidence(confidence),
            RuleEntry::new("*", "Device:Unknown"),
        ],
        footprint: vec![RuleEntry::new("*", "Unknown:Footprint")],
        category: vec![RuleEntry::new("*", "Uncategorized")],
    }
}

fn engine_with_cache(rules: RuleSet, cache: Arc<SharedCache>) -> MappingEngine {
    MappingEngine::new(
        rules,
        SimilarityCatalog::empty(),
        FieldTable::default(),
        EngineConfig::default(),
        &StrategyRegistry::builtin(),
        cache,
    )
    .expect("engine")
}

/// Carries an identifier for every category, so each one is cached.
fn resistor() -> ComponentRecord {
    ComponentRecord::new()
        .with_field("Symbol", "R10K")
        .with_field("Footprint", "RES_0603")
}

fn populated_snapshot() -> CacheSnapshot {
    let rules = RuleSet::load(&rule_config(0.9)).expect("rules");
    let cache = Arc::new(SharedCache::new());
    let engine = engine_with_cache(rules.clone(), cache.clone());
    engine.map_record(&resistor());
    CacheSnapshot::capture(&rules, &cache)
}

#[test]
fn snapshot_save_and_load() {
    let dir = TempDir::new().expect("temp dir");
    let repo = CacheRepository::new(dir.path().join("nested").join("cache.json"));
    assert!(repo.load().expect("load missing").is_none());

    let snapshot = populated_snapshot();
    assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    assert_eq!(snapshot.entries.len(), 3);
    repo.save(&snapshot).expect("save snapshot");
    assert!(repo.exists());

    let loaded = repo.load().expect("load").expect("snapshot present");
    assert_eq!(loaded, snapshot);
}

#[test]
fn compatible_snapshot_seeds_stale_entries() {
    let snapshot = populated_snapshot();
    let rules = RuleSet::load(&rule_config(0.9)).expect("rules");
    let config = EngineConfig::default();
    let cache = snapshot
        .into_cache(&rules, &ConfidenceScorer::new(&config))
        .expect("compatible snapshot");
    assert_eq!(cache.len(), 3);

    let cache = Arc::new(cache);
    let engine = engine_with_cache(rules, cache.clone());
    let outcome = engine.map_record_traced(&resistor());
    let symbol = &outcome.component.symbol;
    assert_eq!(symbol.target, "Device:R");
    assert_eq!(symbol.strategy, Strategy::Cache);
    assert!((symbol.confidence - 0.9 * 0.95).abs() < 1e-6);
    assert!(symbol.warnings[0].starts_with("stale_cache_reuse"));
    assert!(
        outcome
            .issues
            .contains(&(RuleCategory::Symbol, IssueKind::StaleCacheReuse))
    );
    assert_eq!(cache.stats().hits, 3);
}

#[test]
fn reseeding_does_not_compound_discount() {
    let rules = RuleSet::load(&rule_config(0.9)).expect("rules");
    let scorer = ConfidenceScorer::new(&EngineConfig::default());
    let first = populated_snapshot()
        .into_cache(&rules, &scorer)
        .expect("compatible");
    let second = CacheSnapshot::capture(&rules, &first)
        .into_cache(&rules, &scorer)
        .expect("compatible");
    assert_eq!(first.entries(), second.entries());
}

#[test]
fn snapshot_from_other_rules_is_ignored() {
    let snapshot = populated_snapshot();
    let other = RuleSet::load(&rule_config(0.7)).expect("rules");
    assert!(!snapshot.is_compatible(&other));
    let scorer = ConfidenceScorer::new(&EngineConfig::default());
    assert!(snapshot.into_cache(&other, &scorer).is_none());
}

#[test]
fn unsupported_version_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("cache.json");
    let mut snapshot = populated_snapshot();
    snapshot.version = SNAPSHOT_VERSION + 1;
    fs::write(&path, serde_json::to_string(&snapshot).expect("serialize")).expect("write");

    let error = CacheRepository::new(&path).load().expect_err("version mismatch");
    assert!(matches!(error, RepositoryError::UnsupportedVersion { found, .. } if found == SNAPSHOT_VERSION + 1));
}

#[test]
fn corrupt_snapshot_is_reported() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("cache.json");
    fs::write(&path, "{ not json").expect("write");
    let error = CacheRepository::new(&path).load().expect_err("corrupt file");
    assert!(matches!(error, RepositoryError::Deserialization { .. }));
}
