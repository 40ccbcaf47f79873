//! Source component records.
//!
//! A [`ComponentRecord`] is one row extracted from the source library: a flat
//! map of field name to string value. Records are built once by the data
//! source and never mutated by the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One component read from the source library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRecord {
    fields: BTreeMap<String, String>,
}

impl ComponentRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from `(name, value)` pairs.
    ///
    /// Later duplicates of the same field name replace earlier ones.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// Adds a field, consuming the record.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Looks up a field by name.
    ///
    /// An exact match is preferred; otherwise the first field whose name
    /// matches ignoring ASCII case is returned.
    pub fn get(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.fields.get(name) {
            return Some(value.as_str());
        }
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the first of `names` that is present with a non-blank value,
    /// as `(field name, trimmed value)`.
    pub fn first_non_empty<'a, S>(&'a self, names: &'a [S]) -> Option<(&'a str, &'a str)>
    where
        S: AsRef<str>,
    {
        names.iter().find_map(|name| {
            let name = name.as_ref();
            let value = self.get(name)?.trim();
            (!value.is_empty()).then_some((name, value))
        })
    }

    /// Iterates over `(name, value)` pairs in field-name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ComponentRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_fields(iter)
    }
}

impl From<BTreeMap<String, String>> for ComponentRecord {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }
}
