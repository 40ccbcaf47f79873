//! Per-run result cache shared by all workers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use partmap_model::{MappingResult, RuleCategory};
use serde::{Deserialize, Serialize};

/// Concurrency-safe memo of resolved results, keyed per category.
///
/// Entries are append-only: once a key is stored it is never replaced.
pub trait ResultCache: Send + Sync {
    /// Returns the stored result for `key`, if any.
    fn get(&self, category: RuleCategory, key: &str) -> Option<MappingResult>;

    /// Stores `result` unless the key is already present, and returns the
    /// value that ends up stored.
    fn put_if_absent(&self, category: RuleCategory, key: &str, result: MappingResult)
    -> MappingResult;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit/miss counters; caches that do not count report zeros.
    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            ..CacheStats::default()
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Map behind a read/write lock, first write wins.
#[derive(Debug, Default)]
pub struct SharedCache {
    entries: RwLock<HashMap<(RuleCategory, String), MappingResult>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-populated with `entries`. Later duplicates of a key
    /// are ignored.
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (RuleCategory, String, MappingResult)>,
    {
        let mut map = HashMap::new();
        for (category, key, result) in entries {
            map.entry((category, key)).or_insert(result);
        }
        Self {
            entries: RwLock::new(map),
            ..Self::default()
        }
    }

    /// Copies the current entries, sorted by category then key.
    pub fn entries(&self) -> Vec<(RuleCategory, String, MappingResult)> {
        let guard = self.entries.read();
        let mut entries: Vec<_> = guard
            .iter()
            .map(|((category, key), result)| (*category, key.clone(), result.clone()))
            .collect();
        entries.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
        entries
    }
}

impl ResultCache for SharedCache {
    fn get(&self, category: RuleCategory, key: &str) -> Option<MappingResult> {
        let found = self
            .entries
            .read()
            .get(&(category, key.to_string()))
            .cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn put_if_absent(
        &self,
        category: RuleCategory,
        key: &str,
        result: MappingResult,
    ) -> MappingResult {
        let mut guard = self.entries.write();
        guard
            .entry((category, key.to_string()))
            .or_insert(result)
            .clone()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
