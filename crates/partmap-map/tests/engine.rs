use std::sync::Arc;

use partmap_map::{
    EngineConfig, FieldTable, MappingEngine, Matcher, ResultCache, RuleSet, SharedCache,
    SimilarityCatalog, StrategyRegistry,
};
use partmap_model::{
    ComponentRecord, IssueKind, MappingResult, MatchingError, RuleCategory, RuleConfig, RuleEntry,
    RuleValidationError, Strategy,
};

fn passive_rules() -> RuleConfig {
    RuleConfig {
        symbol: vec![
            RuleEntry::new("R*", "Device:R")
                .with_confidence(0.9)
                .with_keywords(["resistor"]),
            RuleEntry::new("C*", "Device:C")
                .with_confidence(0.9)
                .with_keywords(["capacitor"]),
            RuleEntry::new("*", "Device:Unknown").with_confidence(0.1),
        ],
        footprint: vec![
            RuleEntry::new("0603", "Resistor_SMD:R_0603_1608Metric").with_confidence(0.85),
            RuleEntry::new("SOIC-8", "Package_SO:SOIC-8_3.9x4.9mm_P1.27mm"),
            RuleEntry::new("*", "Unknown:Footprint"),
        ],
        category: vec![
            RuleEntry::new("R*", "Passive Components").with_keywords(["resistor"]),
            RuleEntry::new("*", "Uncategorized"),
        ],
    }
}

fn engine_with(config: EngineConfig, catalog: SimilarityCatalog) -> (MappingEngine, Arc<SharedCache>) {
    let cache = Arc::new(SharedCache::new());
    let engine = MappingEngine::new(
        RuleSet::load(&passive_rules()).expect("load rules"),
        catalog,
        FieldTable::default(),
        config,
        &StrategyRegistry::builtin(),
        cache.clone(),
    )
    .expect("build engine");
    (engine, cache)
}

fn engine() -> MappingEngine {
    engine_with(EngineConfig::default(), SimilarityCatalog::empty()).0
}

fn symbol(value: &str) -> ComponentRecord {
    ComponentRecord::new().with_field("Symbol", value)
}

#[test]
fn specific_wildcard_beats_universal() {
    let rules = RuleSet::load(&RuleConfig {
        symbol: vec![
            RuleEntry::new("RES*", "Device:R"),
            RuleEntry::new("*", "Device:Unknown"),
        ],
        footprint: vec![RuleEntry::new("*", "Unknown:Footprint")],
        category: vec![RuleEntry::new("*", "Uncategorized")],
    })
    .expect("load rules");
    let engine = MappingEngine::with_rules(rules, EngineConfig::default()).expect("engine");
    let result = engine
        .matcher()
        .resolve(RuleCategory::Symbol, &symbol("RES10K"));
    assert_eq!(result.target, "Device:R");
    assert_eq!(result.strategy, Strategy::Pattern);
}

#[test]
fn end_to_end_passives() {
    let engine = engine();
    let outputs: Vec<(String, f32)> = ["R10K", "C100nF", "XYZ123"]
        .into_iter()
        .map(|id| {
            let result = engine.matcher().resolve(RuleCategory::Symbol, &symbol(id));
            (result.target, result.confidence)
        })
        .collect();
    assert_eq!(
        outputs,
        [
            ("Device:R".to_string(), 0.9),
            ("Device:C".to_string(), 0.9),
            ("Device:Unknown".to_string(), 0.1),
        ]
    );
}

#[test]
fn fallback_covers_unmatched_input() {
    let engine = engine();
    let resolution = engine
        .matcher()
        .resolve_traced(RuleCategory::Symbol, &symbol("XYZ123"));
    assert_eq!(resolution.result.strategy, Strategy::Fallback);
    assert_eq!(resolution.result.confidence, 0.1);
    assert_eq!(resolution.result.matched_rule_id.as_deref(), Some("symbol#3"));
    assert_eq!(resolution.issues, [IssueKind::FallbackUsed]);
}

#[test]
fn fuzzy_match_reports_similarity() {
    let catalog = SimilarityCatalog {
        symbols: vec!["Device:Resistor".to_string()],
        ..SimilarityCatalog::empty()
    };
    let (engine, _) = engine_with(EngineConfig::default(), catalog);
    // No pattern starts with 'E', so only the catalog can resolve it.
    let result = engine
        .matcher()
        .resolve(RuleCategory::Symbol, &symbol("ESISTOR"));
    assert_eq!(result.target, "Device:Resistor");
    assert_eq!(result.strategy, Strategy::Fuzzy);
    assert!((result.confidence - 0.875).abs() < 1e-6);
}

#[test]
fn fuzzy_below_threshold_falls_through() {
    let catalog = SimilarityCatalog {
        symbols: vec!["Device:Resistor".to_string()],
        ..SimilarityCatalog::empty()
    };
    let (engine, _) = engine_with(EngineConfig::default(), catalog);
    let result = engine.matcher().resolve(RuleCategory::Symbol, &symbol("XYZ123"));
    assert_eq!(result.strategy, Strategy::Fallback);
}

#[test]
fn keyword_match_on_description() {
    let engine = engine();
    let record = symbol("PN-4471").with_field("Description", "Thick film RESISTOR 1%");
    let result = engine.matcher().resolve(RuleCategory::Symbol, &record);
    assert_eq!(result.target, "Device:R");
    assert_eq!(result.strategy, Strategy::Keyword);
    assert!((result.confidence - 0.72).abs() < 1e-6);
    assert_eq!(result.matched_rule_id.as_deref(), Some("symbol#1"));
}

#[test]
fn package_code_drives_footprint_rules() {
    let engine = engine();
    let record = symbol("R10K").with_field("Footprint", "RES_0603_HD");
    let result = engine.matcher().resolve(RuleCategory::Footprint, &record);
    assert_eq!(result.target, "Resistor_SMD:R_0603_1608Metric");
    assert_eq!(result.confidence, 0.85);

    let record = symbol("U1").with_field("Footprint", "IC").with_field("Package", "SOIC8");
    let result = engine.matcher().resolve(RuleCategory::Footprint, &record);
    assert_eq!(result.target, "Package_SO:SOIC-8_3.9x4.9mm_P1.27mm");
}

#[test]
fn repeated_resolution_is_identical_and_cached() {
    let (engine, cache) = engine_with(EngineConfig::default(), SimilarityCatalog::empty());
    let record = symbol("R10K").with_field("Value", "10k");
    let first = engine.matcher().resolve_traced(RuleCategory::Symbol, &record);
    let second = engine.matcher().resolve_traced(RuleCategory::Symbol, &record);
    assert_eq!(first.result, second.result);
    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(cache.len(), 1);
    assert_eq!(second.result.strategy, Strategy::Pattern);
}

#[test]
fn missing_identifier_falls_back_with_warning() {
    let (engine, cache) = engine_with(EngineConfig::default(), SimilarityCatalog::empty());
    let record = ComponentRecord::new().with_field("Description", "mystery part");
    let resolution = engine
        .matcher()
        .resolve_traced(RuleCategory::Symbol, &record);
    assert_eq!(resolution.result.strategy, Strategy::Fallback);
    assert_eq!(resolution.result.warnings.len(), 1);
    assert!(resolution.result.warnings[0].contains("no symbol identifier"));
    assert_eq!(
        resolution.issues,
        [IssueKind::FallbackUsed, IssueKind::MissingIdentifier]
    );
    assert!(cache.is_empty());
}

#[test]
fn footprint_without_identifier_resolves_from_package() {
    let (engine, cache) = engine_with(EngineConfig::default(), SimilarityCatalog::empty());
    let record = symbol("R10K")
        .with_field("Package", "0603")
        .with_field("Description", "Thick film resistor 0603");
    let resolution = engine
        .matcher()
        .resolve_traced(RuleCategory::Footprint, &record);
    assert_eq!(resolution.result.target, "Resistor_SMD:R_0603_1608Metric");
    assert_eq!(resolution.result.strategy, Strategy::Pattern);
    assert_eq!(resolution.result.confidence, 0.85);
    assert!(resolution.result.warnings.is_empty());
    assert!(resolution.issues.is_empty());
    // Nothing to key the entry on.
    assert!(cache.is_empty());
}

#[test]
fn keyword_runs_without_identifier() {
    let engine = engine();
    let record = ComponentRecord::new().with_field("Description", "Thick film resistor");
    let resolution = engine
        .matcher()
        .resolve_traced(RuleCategory::Symbol, &record);
    assert_eq!(resolution.result.target, "Device:R");
    assert_eq!(resolution.result.strategy, Strategy::Keyword);
    assert!(resolution.issues.is_empty());
}

#[test]
fn identifier_case_and_padding_share_a_cache_entry() {
    let (engine, cache) = engine_with(EngineConfig::default(), SimilarityCatalog::empty());
    let first = engine
        .matcher()
        .resolve_traced(RuleCategory::Symbol, &symbol("R10K"));
    let second = engine
        .matcher()
        .resolve_traced(RuleCategory::Symbol, &symbol(" r10k "));
    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(second.result, first.result);
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, cache.len()), (1, 1, 1));
}

#[test]
fn failing_strategy_is_isolated() {
    use partmap_map::{MatchContext, MatchStrategy};

    struct Broken;

    impl MatchStrategy for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn kind(&self) -> Strategy {
            Strategy::Pattern
        }

        fn attempt(&self, ctx: &MatchContext<'_>) -> Result<Option<MappingResult>, MatchingError> {
            Err(MatchingError::StrategyFailed {
                category: ctx.category,
                strategy: "broken".to_string(),
                message: "lookup table unavailable".to_string(),
            })
        }
    }

    let mut registry = StrategyRegistry::builtin();
    registry.register("broken", |_| Box::new(Broken));
    let config = EngineConfig {
        strategies: vec!["broken".to_string(), "pattern".to_string()],
        ..EngineConfig::default()
    };
    let matcher = Matcher::new(
        RuleSet::load(&passive_rules()).expect("rules"),
        SimilarityCatalog::empty(),
        &config,
        &registry,
        Arc::new(SharedCache::new()),
    )
    .expect("matcher");
    let resolution = matcher.resolve_traced(RuleCategory::Symbol, &symbol("R10K"));
    assert_eq!(resolution.result.target, "Device:Unknown");
    assert_eq!(resolution.issues, [IssueKind::StrategyFailed]);
    assert!(resolution.result.warnings[0].contains("lookup table unavailable"));
}

#[test]
fn speculative_mode_picks_highest_confidence() {
    let catalog = SimilarityCatalog {
        symbols: vec!["Device:R10K".to_string()],
        ..SimilarityCatalog::empty()
    };
    let config = EngineConfig {
        speculative: true,
        ..EngineConfig::default()
    };
    let (engine, _) = engine_with(config, catalog.clone());
    // Pattern proposes 0.9, the catalog has an exact name at 1.0.
    let result = engine.matcher().resolve(RuleCategory::Symbol, &symbol("R10K"));
    assert_eq!(result.target, "Device:R10K");
    assert_eq!(result.strategy, Strategy::Fuzzy);

    let (engine, _) = engine_with(EngineConfig::default(), catalog);
    let result = engine.matcher().resolve(RuleCategory::Symbol, &symbol("R10K"));
    assert_eq!(result.target, "Device:R");
}

#[test]
fn raising_acceptance_rejects_weak_results() {
    let config = EngineConfig {
        min_acceptance: 0.95,
        ..EngineConfig::default()
    };
    let (engine, _) = engine_with(config, SimilarityCatalog::empty());
    let result = engine.matcher().resolve(RuleCategory::Symbol, &symbol("R10K"));
    assert_eq!(result.strategy, Strategy::Fallback);
}

#[test]
fn map_record_resolves_all_categories_and_fields() {
    let engine = engine();
    let record = symbol("R10K")
        .with_field("Footprint", "RES_0603_HD")
        .with_field("Part Number", "RC0603FR-0710KL")
        .with_field("Description", "Resistor 10k 1%");
    let mapped = engine.map_record(&record);
    assert_eq!(mapped.symbol.target, "Device:R");
    assert_eq!(mapped.footprint.target, "Resistor_SMD:R_0603_1608Metric");
    assert_eq!(mapped.category.target, "Passive Components");
    assert_eq!(mapped.fields["MPN"], "RC0603FR-0710KL");
    assert_eq!(mapped.record, record);
}

#[test]
fn load_rejects_empty_pattern() {
    let mut config = passive_rules();
    config.symbol.insert(0, RuleEntry::new("", "Device:R"));
    let error = RuleSet::load(&config).expect_err("empty pattern");
    assert!(matches!(error, RuleValidationError::EmptyPattern { .. }));
}

#[test]
fn unknown_strategy_fails_engine_construction() {
    let config = EngineConfig {
        strategies: vec!["cache".to_string(), "neural".to_string()],
        ..EngineConfig::default()
    };
    let rules = RuleSet::load(&passive_rules()).expect("rules");
    assert!(MappingEngine::with_rules(rules, config).is_err());
}
