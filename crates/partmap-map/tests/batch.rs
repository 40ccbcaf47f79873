use partmap_map::{
    BatchRunner, CancelFlag, ConfidenceLevel, EngineConfig, MappingEngine, RuleSet,
};
use partmap_model::{
    ComponentRecord, IssueKind, IssueSeverity, RuleCategory, RuleConfig, RuleEntry, Strategy,
};

fn rules() -> RuleSet {
    RuleSet::load(&RuleConfig {
        symbol: vec![
            RuleEntry::new("R*", "Device:R").with_confidence(0.9),
            RuleEntry::new("C*", "Device:C").with_confidence(0.9),
            RuleEntry::new("*", "Device:Unknown"),
        ],
        footprint: vec![
            RuleEntry::new("*0603*", "Resistor_SMD:R_0603_1608Metric"),
            RuleEntry::new("*", "Unknown:Footprint"),
        ],
        category: vec![RuleEntry::new("*", "Uncategorized")],
    })
    .expect("load rules")
}

fn records(count: usize) -> Vec<ComponentRecord> {
    (0..count)
        .map(|index| {
            let symbol = match index % 3 {
                0 => format!("R{index}K"),
                1 => format!("C{index}nF"),
                _ => format!("XYZ{index}"),
            };
            ComponentRecord::new()
                .with_field("Symbol", symbol)
                .with_field("Footprint", if index % 2 == 0 { "R_0603" } else { "QQ" })
        })
        .collect()
}

fn engine() -> MappingEngine {
    MappingEngine::with_rules(rules(), EngineConfig::default()).expect("engine")
}

#[test]
fn outputs_follow_input_order() {
    let engine = engine();
    let records = records(30);
    let report = BatchRunner::new(&engine)
        .with_workers(4)
        .run(&records, &CancelFlag::new());
    assert!(!report.cancelled);
    assert_eq!(report.outputs.len(), 30);
    for (record, output) in records.iter().zip(&report.outputs) {
        assert_eq!(&output.record, record);
    }
}

#[test]
fn worker_count_does_not_change_results() {
    let records = records(60);
    let single = BatchRunner::new(&engine())
        .with_workers(1)
        .run(&records, &CancelFlag::new());
    let parallel = BatchRunner::new(&engine())
        .with_workers(8)
        .run(&records, &CancelFlag::new());
    assert_eq!(single.outputs, parallel.outputs);
    assert_eq!(single.summary.categories, parallel.summary.categories);
    assert_eq!(single.summary.issues, parallel.summary.issues);
}

#[test]
fn summary_counts_strategies_levels_and_issues() {
    let engine = engine();
    let report = BatchRunner::new(&engine)
        .with_workers(2)
        .run(&records(6), &CancelFlag::new());
    let summary = &report.summary;
    assert_eq!(summary.records_total, 6);
    assert_eq!(summary.records_processed, 6);
    assert_eq!(summary.records_skipped(), 0);

    let symbols = summary.category(RuleCategory::Symbol).expect("symbol summary");
    assert_eq!(symbols.strategy_count(Strategy::Pattern), 4);
    assert_eq!(symbols.strategy_count(Strategy::Fallback), 2);
    assert_eq!(symbols.level_count(ConfidenceLevel::High), 4);
    assert_eq!(symbols.level_count(ConfidenceLevel::Low), 2);
    let mean = symbols.mean_confidence().expect("mean");
    assert!((mean - (4.0 * 0.9 + 2.0 * 0.1) / 6.0).abs() < 1e-5);

    // 2 symbol + 3 footprint + 6 category fallbacks.
    assert_eq!(summary.issue_count(IssueKind::FallbackUsed), 11);
    assert_eq!(summary.severity_count(IssueSeverity::Warning), 11);
    assert_eq!(summary.issue_count(IssueKind::MissingIdentifier), 0);
}

#[test]
fn cancelled_run_skips_remaining_records() {
    let engine = engine();
    let cancel = CancelFlag::new();
    cancel.cancel();
    let report = BatchRunner::new(&engine)
        .with_workers(3)
        .run(&records(10), &cancel);
    assert!(report.cancelled);
    assert!(report.outputs.is_empty());
    assert_eq!(report.summary.records_skipped(), 10);
}

#[test]
fn empty_batch_is_fine() {
    let engine = engine();
    let report = BatchRunner::new(&engine).run(&[], &CancelFlag::new());
    assert!(report.outputs.is_empty());
    assert!(!report.cancelled);
    assert_eq!(report.summary.records_processed, 0);
}

#[test]
fn repeated_identifiers_hit_the_cache() {
    let engine = engine();
    let record = ComponentRecord::new()
        .with_field("Symbol", "R10K")
        .with_field("Footprint", "R_0603");
    let records = vec![record; 5];
    let report = BatchRunner::new(&engine)
        .with_workers(1)
        .run(&records, &CancelFlag::new());
    // One miss and four hits per category.
    assert_eq!(report.summary.cache.hits, 12);
    assert_eq!(report.summary.cache.misses, 3);
    assert_eq!(report.summary.cache.entries, 3);
}
