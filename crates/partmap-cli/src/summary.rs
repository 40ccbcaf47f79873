use std::fmt::Write as _;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use partmap_map::{CategorySummary, ConfidenceLevel, RunSummary};
use partmap_model::{IssueSeverity, RuleCategory, Strategy};

use partmap_cli::types::{CacheOrigin, MapRun};

/// Strategy columns of the summary table, strongest evidence first.
const STRATEGY_COLUMNS: [Strategy; 5] = [
    Strategy::Pattern,
    Strategy::Fuzzy,
    Strategy::Keyword,
    Strategy::Cache,
    Strategy::Fallback,
];

pub fn render_summary(run: &MapRun) -> String {
    let summary = &run.report.summary;
    let mut text = String::new();
    let _ = writeln!(text, "Records: {}", run.records_path.display());
    match &run.output_path {
        Some(path) => {
            let _ = writeln!(text, "Output: {}", path.display());
        }
        None => {
            let _ = writeln!(text, "Output: stdout");
        }
    }
    let _ = writeln!(
        text,
        "Mapped {} of {} records{}",
        summary.records_processed,
        summary.records_total,
        if run.report.cancelled { " (cancelled)" } else { "" }
    );
    if run.input_skipped > 0 {
        let _ = writeln!(text, "Unreadable input rows skipped: {}", run.input_skipped);
    }
    if let Some(path) = &run.cache_path {
        let _ = writeln!(
            text,
            "Cache: {} ({}; {} hits, {} misses, {} entries)",
            path.display(),
            cache_origin_label(run.cache_origin),
            summary.cache.hits,
            summary.cache.misses,
            summary.cache.entries
        );
    }
    let _ = writeln!(text, "{}", category_table(summary));
    if let Some(table) = issue_table(summary) {
        let _ = writeln!(text, "{table}");
    }
    text
}

fn cache_origin_label(origin: CacheOrigin) -> String {
    match origin {
        CacheOrigin::Disabled => "disabled".to_string(),
        CacheOrigin::Empty => "new".to_string(),
        CacheOrigin::Seeded { entries } => format!("seeded with {entries} entries"),
        CacheOrigin::Stale => "previous snapshot ignored".to_string(),
    }
}

fn category_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    let mut header = vec![header_cell("Category"), header_cell("Records")];
    header.extend(STRATEGY_COLUMNS.iter().map(|strategy| header_cell(strategy.as_str())));
    header.extend(ConfidenceLevel::ALL.iter().map(|level| header_cell(level.as_str())));
    header.push(header_cell("Mean"));
    table.set_header(header);
    apply_summary_table_style(&mut table);
    for index in 1..table.column_count() {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let empty = CategorySummary::default();
    for category in RuleCategory::ALL {
        let counts = summary.category(category).unwrap_or(&empty);
        let mut row = vec![
            Cell::new(category.as_str()).add_attribute(Attribute::Bold),
            Cell::new(counts.strategies.values().sum::<usize>()),
        ];
        row.extend(
            STRATEGY_COLUMNS
                .iter()
                .map(|strategy| count_cell(counts.strategy_count(*strategy), strategy_color(*strategy))),
        );
        row.extend(
            ConfidenceLevel::ALL
                .iter()
                .map(|level| count_cell(counts.level_count(*level), level_color(*level))),
        );
        row.push(match counts.mean_confidence() {
            Some(mean) => Cell::new(format!("{mean:.2}")),
            None => dim_cell("-"),
        });
        table.add_row(row);
    }
    table
}

fn issue_table(summary: &RunSummary) -> Option<Table> {
    if summary.issues.is_empty() {
        return None;
    }
    let mut issues: Vec<_> = summary.issues.iter().collect();
    issues.sort_by(|a, b| (a.0.1, a.0.0).cmp(&(b.0.1, b.0.0)));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Issue"),
        header_cell("Severity"),
        header_cell("Count"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);
    for ((kind, severity), count) in issues {
        table.add_row(vec![
            Cell::new(kind.as_str()),
            severity_cell(*severity),
            Cell::new(count).fg(severity_color(*severity)),
        ]);
    }
    Some(table)
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

pub fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).add_attribute(Attribute::Dim)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        dim_cell(0)
    } else {
        Cell::new(count).fg(color)
    }
}

fn strategy_color(strategy: Strategy) -> Color {
    match strategy {
        Strategy::Pattern | Strategy::Cache => Color::Green,
        Strategy::Fuzzy | Strategy::Keyword => Color::Yellow,
        Strategy::Fallback => Color::Red,
    }
}

fn level_color(level: ConfidenceLevel) -> Color {
    match level {
        ConfidenceLevel::High => Color::Green,
        ConfidenceLevel::Medium => Color::Yellow,
        ConfidenceLevel::Low => Color::Red,
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    Cell::new(severity.as_str())
        .fg(severity_color(severity))
        .add_attribute(Attribute::Bold)
}

fn severity_color(severity: IssueSeverity) -> Color {
    match severity {
        IssueSeverity::Warning => Color::Yellow,
        IssueSeverity::Info => Color::Blue,
    }
}
