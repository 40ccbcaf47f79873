use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Table};
use tracing::info;

use partmap_cli::input::load_rules;
use partmap_cli::pipeline::{MapRequest, run_map};
use partmap_cli::settings::Settings;
use partmap_cli::types::MapRun;
use partmap_model::{RuleCategory, RuleKind};

use crate::cli::{CatalogArgs, MapArgs, RulesArgs};
use crate::summary::{align_column, apply_table_style, dim_cell, header_cell};

pub fn run_map_command(args: &MapArgs) -> Result<MapRun> {
    let request = MapRequest {
        records: args.records.clone(),
        rules: args.rules.clone(),
        config: args.config.clone(),
        output: args.output.clone(),
        cache: args.cache.clone(),
        workers: args.workers,
        speculative: args.speculative,
        min_acceptance: args.min_acceptance,
    };
    run_map(&request)
}

pub fn run_rules(args: &RulesArgs) -> Result<()> {
    let rules = load_rules(&args.rules)?;
    info!(rules = rules.len(), fingerprint = %rules.fingerprint(), "rule file is valid");

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Category"),
        header_cell("#"),
        header_cell("Id"),
        header_cell("Pattern"),
        header_cell("Kind"),
        header_cell("Specificity"),
        header_cell("Target"),
        header_cell("Confidence"),
        header_cell("Keywords"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Right);
    align_column(&mut table, 7, CellAlignment::Right);
    for category in RuleCategory::ALL {
        for (position, rule) in rules.rules(category).iter().enumerate() {
            let kind = match rule.kind {
                RuleKind::Exact => "exact",
                RuleKind::Wildcard => "wildcard",
            };
            let keywords = if rule.keywords.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(
                    rule.keywords.iter().cloned().collect::<Vec<_>>().join(", "),
                )
            };
            table.add_row(vec![
                Cell::new(category.as_str()),
                Cell::new(position + 1),
                Cell::new(&rule.id),
                Cell::new(&rule.pattern),
                Cell::new(kind),
                Cell::new(rule.specificity()),
                Cell::new(&rule.target),
                Cell::new(format!("{:.2}", rule.confidence)),
                keywords,
            ]);
        }
    }
    println!("{table}");
    println!("Fingerprint: {}", rules.fingerprint());
    Ok(())
}

pub fn run_catalog(args: &CatalogArgs) -> Result<()> {
    let settings = Settings::load(args.config.as_deref())?;
    let catalog = settings.catalog;
    catalog.validate()?;

    let mut table = Table::new();
    table.set_header(vec![header_cell("Category"), header_cell("Name")]);
    apply_table_style(&mut table);
    for category in RuleCategory::ALL {
        for name in catalog.names(category) {
            table.add_row(vec![category.as_str(), name.as_str()]);
        }
    }
    println!("{table}");
    Ok(())
}
