//! Integration tests for the `map` run.

use std::fs;
use std::path::Path;

use partmap_cli::input::{read_csv_records, read_json_records};
use partmap_cli::pipeline::{MapRequest, run_map};
use partmap_cli::types::CacheOrigin;
use partmap_model::{IssueKind, MappedComponent, MappingResult, RuleCategory, Strategy};
use serde_json::{Value, json};
use tempfile::TempDir;

const RULES: &str = r#"{
    "symbol": [
        {"id": "sym-r", "pattern": "R*", "target": "Device:R", "confidence": 0.9},
        {"id": "sym-c", "pattern": "C*", "target": "Device:C", "confidence": 0.9},
        {"id": "sym-any", "pattern": "*", "target": "Device:Unknown", "confidence": 0.1}
    ],
    "footprint": [
        {"id": "fp-0603", "pattern": "0603", "target": "Resistor_SMD:R_0603_1608Metric", "confidence": 0.9},
        {"id": "fp-0805", "pattern": "0805", "target": "Capacitor_SMD:C_0805_2012Metric", "confidence": 0.9},
        {"id": "fp-any", "pattern": "*", "target": "Unknown:Footprint", "confidence": 0.1}
    ],
    "category": [
        {"id": "cat-passive", "pattern": "PASSIVE*", "target": "Passive Components",
         "confidence": 0.9, "keywords": ["resistor", "capacitor"]},
        {"id": "cat-any", "pattern": "*", "target": "Uncategorized", "confidence": 0.1}
    ]
}"#;

const RECORDS: &str = "\u{feff}Symbol,Description,Footprint,Value\n\
                       R10K,Thick film resistor,RES_0603_HD,10k\n\
                       C100nF, Ceramic capacitor ,CAP_0805,100nF\n\
                       XYZ123,,,\n";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("rules.json"), RULES).expect("write rules");
        fs::write(dir.path().join("parts.csv"), RECORDS).expect("write records");
        fs::write(
            dir.path().join("settings.json"),
            r#"{"engine": {"workers": 2}}"#,
        )
        .expect("write settings");
        Self { dir }
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    fn request(&self) -> MapRequest {
        MapRequest {
            records: self.path("parts.csv"),
            rules: self.path("rules.json"),
            config: Some(self.path("settings.json")),
            output: Some(self.path("out").join("mapped.json")),
            ..MapRequest::default()
        }
    }
}

fn read_output(path: &Path) -> Vec<MappedComponent> {
    let text = fs::read_to_string(path).expect("read output");
    serde_json::from_str(&text).expect("parse output")
}

fn rounded(confidence: f32) -> f64 {
    (f64::from(confidence) * 100.0).round() / 100.0
}

fn project_result(result: &MappingResult) -> Value {
    json!({
        "confidence": rounded(result.confidence),
        "rule": result.matched_rule_id,
        "strategy": result.strategy.as_str(),
        "target": result.target,
        "warnings": result.warnings.len(),
    })
}

fn project(components: &[MappedComponent]) -> Value {
    Value::Array(
        components
            .iter()
            .map(|component| {
                json!({
                    "category": project_result(&component.category),
                    "footprint": project_result(&component.footprint),
                    "symbol": project_result(&component.symbol),
                })
            })
            .collect(),
    )
}

#[test]
fn map_writes_every_record_in_input_order() {
    let workspace = Workspace::new();
    let request = workspace.request();
    let run = run_map(&request).expect("map run");

    assert_eq!(run.cache_origin, CacheOrigin::Disabled);
    assert_eq!(run.input_skipped, 0);
    assert!(!run.report.cancelled);
    assert_eq!(run.report.summary.records_processed, 3);

    let outputs = read_output(request.output.as_deref().expect("output path"));
    assert_eq!(outputs, run.report.outputs);
    assert_eq!(outputs[1].record.get("Description"), Some("Ceramic capacitor"));
    insta::assert_json_snapshot!("map_output", project(&outputs));
}

#[test]
fn map_counts_issues_per_category() {
    let workspace = Workspace::new();
    let run = run_map(&workspace.request()).expect("map run");
    let summary = &run.report.summary;

    // The third row has no footprint identifier and nothing else to go on.
    assert_eq!(summary.issue_count(IssueKind::MissingIdentifier), 1);
    assert_eq!(summary.issue_count(IssueKind::FallbackUsed), 3);
    let footprint = &run.report.outputs[2].footprint;
    assert!(footprint.warnings[0].contains("no footprint identifier"));
    let category = summary.category(RuleCategory::Category).expect("category tallies");
    assert_eq!(category.strategy_count(Strategy::Keyword), 2);
    assert_eq!(category.strategy_count(Strategy::Fallback), 1);
}

#[test]
fn cache_file_is_reused_on_the_next_run() {
    let workspace = Workspace::new();
    let request = MapRequest {
        cache: Some(workspace.path("cache.json")),
        ..workspace.request()
    };

    let first = run_map(&request).expect("first run");
    assert_eq!(first.cache_origin, CacheOrigin::Empty);
    assert!(workspace.path("cache.json").exists());

    let second = run_map(&request).expect("second run");
    assert_eq!(second.cache_origin, CacheOrigin::Seeded { entries: 8 });
    let symbol = &second.report.outputs[0].symbol;
    assert_eq!(symbol.strategy, Strategy::Cache);
    assert_eq!(symbol.target, "Device:R");
    assert!((symbol.confidence - 0.9 * 0.95).abs() < 1e-6);
    assert_eq!(
        second.report.summary.issue_count(IssueKind::StaleCacheReuse),
        8
    );
    // No identifier means no cache entry; the record still falls back.
    assert_eq!(second.report.outputs[2].footprint.strategy, Strategy::Fallback);
}

#[test]
fn cache_from_other_rules_is_ignored() {
    let workspace = Workspace::new();
    let request = MapRequest {
        cache: Some(workspace.path("cache.json")),
        ..workspace.request()
    };
    run_map(&request).expect("first run");

    fs::write(
        workspace.path("rules.json"),
        RULES.replace("\"confidence\": 0.9}", "\"confidence\": 0.85}"),
    )
    .expect("rewrite rules");
    let second = run_map(&request).expect("second run");
    assert_eq!(second.cache_origin, CacheOrigin::Stale);
    assert_eq!(second.report.outputs[0].symbol.strategy, Strategy::Pattern);
}

#[test]
fn command_line_overrides_settings() {
    let workspace = Workspace::new();
    let request = MapRequest {
        min_acceptance: Some(0.95),
        ..workspace.request()
    };
    let run = run_map(&request).expect("map run");
    for component in &run.report.outputs {
        for (_, result) in component.results() {
            assert_eq!(result.strategy, Strategy::Fallback);
        }
    }
}

#[test]
fn invalid_rule_file_is_fatal() {
    let workspace = Workspace::new();
    fs::write(
        workspace.path("rules.json"),
        r#"{"symbol": [{"pattern": "R*", "target": "Device:R"}]}"#,
    )
    .expect("write rules");
    let error = run_map(&workspace.request()).expect_err("missing universal rule");
    assert!(format!("{error:#}").contains("invalid rule file"));
}

#[test]
fn csv_reader_strips_bom_and_skips_bad_rows() {
    let input = read_csv_records(
        "\u{feff} Symbol ,Value\nR10K, 10k \nC1,1u,extra\n,\n".as_bytes(),
    )
    .expect("read csv");
    assert_eq!(input.records.len(), 1);
    assert_eq!(input.skipped, 1);
    assert_eq!(input.records[0].get("Symbol"), Some("R10K"));
    assert_eq!(input.records[0].get("Value"), Some("10k"));
}

#[test]
fn json_reader_skips_unreadable_records() {
    let input = read_json_records(
        r#"[{"Symbol": "R10K"}, "oops", {"Symbol": {"nested": true}}, {"Symbol": "C1"}]"#
            .as_bytes(),
    )
    .expect("read json");
    assert_eq!(input.records.len(), 2);
    assert_eq!(input.skipped, 2);
    assert!(read_json_records(r#"{"Symbol": "R10K"}"#.as_bytes()).is_err());
}
