//! Reading source records and rule files.
//!
//! Records come either from a CSV export (header row holds the field names)
//! or from a JSON array of flat objects. A row that cannot be read is logged
//! and skipped; the file as a whole only fails when it cannot be opened or
//! its structure is unusable.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use partmap_map::RuleSet;
use partmap_model::{ComponentRecord, RuleConfig};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::logging::{log_data_enabled, redact_value};

/// Records read from one input file.
#[derive(Debug, Clone, Default)]
pub struct RecordInput {
    pub records: Vec<ComponentRecord>,
    /// Rows dropped because they could not be parsed.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Csv,
    Json,
}

impl RecordFormat {
    /// Picks the format from the file extension; anything but `.json` is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

/// Reads records from `path`.
pub fn read_records(path: &Path) -> Result<RecordInput> {
    let file = File::open(path).with_context(|| format!("open records {}", path.display()))?;
    let input = match RecordFormat::from_path(path) {
        RecordFormat::Csv => read_csv_records(file),
        RecordFormat::Json => read_json_records(file),
    }
    .with_context(|| format!("read records {}", path.display()))?;
    debug!(
        path = %path.display(),
        records = input.records.len(),
        skipped = input.skipped,
        "records loaded"
    );
    Ok(input)
}

/// Reads CSV records. Header names and values are trimmed, a UTF-8 BOM on
/// the first header is dropped and blank cells are left out of the record.
pub fn read_csv_records<R: Read>(source: R) -> Result<RecordInput> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);
    let headers: Vec<String> = reader
        .headers()
        .context("read CSV header row")?
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let name = if index == 0 {
                name.strip_prefix('\u{feff}').unwrap_or(name)
            } else {
                name
            };
            name.trim().to_string()
        })
        .collect();
    if headers.iter().all(String::is_empty) {
        bail!("CSV header row has no field names");
    }

    let mut input = RecordInput::default();
    for (row, result) in reader.records().enumerate() {
        // Row numbers are 1-based and count the header line.
        let line = row + 2;
        let row_values = match result {
            Ok(values) => values,
            Err(error) => {
                warn!(line, %error, "skipping unreadable CSV row");
                input.skipped += 1;
                continue;
            }
        };
        let record: ComponentRecord = headers
            .iter()
            .zip(row_values.iter())
            .filter(|(name, value)| !name.is_empty() && !value.is_empty())
            .collect();
        if record.is_empty() {
            continue;
        }
        trace_record(line, &record);
        input.records.push(record);
    }
    Ok(input)
}

/// Reads a JSON array of flat objects. Strings, numbers and booleans become
/// field values; `null` fields are dropped. An element that is not an object,
/// or that nests arrays or objects, is skipped.
pub fn read_json_records<R: Read>(source: R) -> Result<RecordInput> {
    let document: Value = serde_json::from_reader(source).context("parse JSON records")?;
    let Value::Array(items) = document else {
        bail!("expected a JSON array of records");
    };
    let mut input = RecordInput::default();
    for (index, item) in items.into_iter().enumerate() {
        match json_record(item) {
            Ok(record) => {
                trace_record(index, &record);
                input.records.push(record);
            }
            Err(reason) => {
                warn!(index, reason, "skipping unreadable JSON record");
                input.skipped += 1;
            }
        }
    }
    Ok(input)
}

fn json_record(item: Value) -> Result<ComponentRecord, &'static str> {
    let Value::Object(fields) = item else {
        return Err("record is not an object");
    };
    let mut record = ComponentRecord::new();
    for (name, value) in fields {
        let text = match value {
            Value::Null => continue,
            Value::String(text) => text.trim().to_string(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Array(_) | Value::Object(_) => return Err("record has a nested value"),
        };
        record = record.with_field(name.trim(), text);
    }
    Ok(record)
}

fn trace_record(position: usize, record: &ComponentRecord) {
    if !log_data_enabled() {
        return;
    }
    for (name, value) in record.fields() {
        trace!(position, field = name, value = redact_value(value), "record field");
    }
}

/// Reads and validates a rule file.
pub fn load_rules(path: &Path) -> Result<RuleSet> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read rules {}", path.display()))?;
    let config: RuleConfig = serde_json::from_str(&text)
        .with_context(|| format!("parse rules {}", path.display()))?;
    let rules = RuleSet::load(&config)
        .with_context(|| format!("invalid rule file {}", path.display()))?;
    debug!(path = %path.display(), rules = rules.len(), "rules loaded");
    Ok(rules)
}
