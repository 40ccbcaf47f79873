//! Field-name translation and value sanitation.
//!
//! Runs next to symbol/footprint resolution and knows nothing about it:
//! known source field names are renamed, everything else passes through, and
//! every value is cleaned rather than rejected.

use std::collections::BTreeMap;

use partmap_model::ComponentRecord;
use serde::{Deserialize, Serialize};

use crate::config::FieldMapperConfig;
use crate::error::{EngineError, Result};

/// Renames applied by default, in priority order.
const DEFAULT_RENAMES: &[(&str, &str)] = &[
    ("Part Number", "MPN"),
    ("Manufacturer Part Number", "MPN"),
    ("Supplier Part Number", "SPN"),
    ("Library Name", "Library"),
    ("ComponentLink1Description", "Link1_Desc"),
    ("ComponentLink1URL", "Link1_URL"),
    ("ComponentLink2Description", "Link2_Desc"),
    ("ComponentLink2URL", "Link2_URL"),
    ("Manufacturer", "Manufacturer"),
    ("Description", "Description"),
    ("Value", "Value"),
    ("Footprint", "Footprint"),
    ("Datasheet", "Datasheet"),
    ("Supplier", "Supplier"),
    ("Package", "Package"),
    ("Voltage", "Voltage"),
    ("Current", "Current"),
    ("Power", "Power"),
    ("Tolerance", "Tolerance"),
    ("Temperature", "Temperature"),
    ("Comment", "Comment"),
];

/// One source-to-target field name pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRename {
    pub source: String,
    pub target: String,
}

/// Static field-name translation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTable {
    entries: Vec<FieldRename>,
}

impl Default for FieldTable {
    fn default() -> Self {
        Self::new(DEFAULT_RENAMES.iter().copied())
    }
}

impl FieldTable {
    pub fn new<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(source, target)| FieldRename {
                    source: source.into(),
                    target: target.into(),
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[FieldRename] {
        &self.entries
    }

    /// Rejects entries with a blank source or target name.
    pub fn validate(&self) -> Result<()> {
        for (index, entry) in self.entries.iter().enumerate() {
            let side = if entry.source.trim().is_empty() {
                "source"
            } else if entry.target.trim().is_empty() {
                "target"
            } else {
                continue;
            };
            return Err(EngineError::EmptyFieldName {
                position: index + 1,
                side,
            });
        }
        Ok(())
    }

    /// Target name for a source field. Exact matches win over
    /// case-insensitive ones.
    pub fn lookup(&self, source: &str) -> Option<&str> {
        let source = source.trim();
        self.entries
            .iter()
            .find(|entry| entry.source == source)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|entry| entry.source.eq_ignore_ascii_case(source))
            })
            .map(|entry| entry.target.as_str())
    }
}

/// Applies a [`FieldTable`] and value sanitation to records.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    table: FieldTable,
    config: FieldMapperConfig,
}

impl FieldMapper {
    pub fn new(table: FieldTable, config: FieldMapperConfig) -> Self {
        Self { table, config }
    }

    pub fn table(&self) -> &FieldTable {
        &self.table
    }

    /// Translates every field of `record`.
    ///
    /// When two source fields land on the same target name, the value already
    /// present is kept unless it is empty.
    pub fn translate(&self, record: &ComponentRecord) -> BTreeMap<String, String> {
        let mut translated: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in record.fields() {
            let target = self.table.lookup(name).unwrap_or(name).to_string();
            let value = self.sanitize(value);
            match translated.get(&target) {
                Some(existing) if !existing.is_empty() => {}
                _ => {
                    translated.insert(target, value);
                }
            }
        }
        translated
    }

    /// Trims, removes NUL characters and truncates to the configured length
    /// (marker included).
    pub fn sanitize(&self, value: &str) -> String {
        let cleaned: String = value.trim().chars().filter(|ch| *ch != '\0').collect();
        let cleaned = cleaned.trim();
        let max = self.config.max_length;
        if cleaned.chars().count() <= max {
            return cleaned.to_string();
        }
        let marker = &self.config.truncation_marker;
        let marker_len = marker.chars().count();
        if marker_len >= max {
            return cleaned.chars().take(max).collect();
        }
        let mut truncated: String = cleaned.chars().take(max - marker_len).collect();
        truncated.push_str(marker);
        truncated
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new(FieldTable::default(), FieldMapperConfig::default())
    }
}
