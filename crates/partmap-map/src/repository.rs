//! Cache snapshot repository for reusing results across runs.
//!
//! A snapshot is a JSON file holding every cache entry of a finished run
//! together with the fingerprint of the rule set that produced it. A later
//! run seeds its cache from the snapshot only when its own rule set has the
//! same fingerprint; otherwise the snapshot is ignored.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use partmap_model::{IssueKind, MappingResult, RuleCategory, Strategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::SharedCache;
use crate::error::RepositoryError;
use crate::rules::RuleSet;
use crate::score::ConfidenceScorer;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One persisted cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub category: RuleCategory,
    pub key: String,
    pub result: MappingResult,
}

/// Persisted cache contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    /// [`RuleSet::fingerprint`] of the rules the entries were computed with.
    pub rules_fingerprint: String,
    pub entries: Vec<SnapshotEntry>,
}

impl CacheSnapshot {
    /// Captures the current contents of `cache`.
    pub fn capture(rules: &RuleSet, cache: &SharedCache) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            rules_fingerprint: rules.fingerprint(),
            entries: cache
                .entries()
                .into_iter()
                .map(|(category, key, result)| SnapshotEntry {
                    category,
                    key,
                    result,
                })
                .collect(),
        }
    }

    /// Whether the snapshot was computed with `rules`.
    pub fn is_compatible(&self, rules: &RuleSet) -> bool {
        self.rules_fingerprint == rules.fingerprint()
    }

    /// Builds a cache seeded with the snapshot entries, or `None` when the
    /// snapshot belongs to a different rule set.
    ///
    /// Entries computed in an earlier run are relabelled as cache results,
    /// discounted by the staleness factor and carry a warning. Entries that
    /// are already cache results are kept unchanged.
    pub fn into_cache(self, rules: &RuleSet, scorer: &ConfidenceScorer) -> Option<SharedCache> {
        if !self.is_compatible(rules) {
            warn!(
                saved_at = %self.saved_at,
                "cache snapshot was built from different rules; starting with an empty cache"
            );
            return None;
        }
        let saved_at = self.saved_at;
        let count = self.entries.len();
        let cache = SharedCache::with_entries(self.entries.into_iter().map(|entry| {
            let result = stale(entry.result, saved_at, scorer);
            (entry.category, entry.key, result)
        }));
        info!(entries = count, saved_at = %saved_at, "seeded cache from snapshot");
        Some(cache)
    }
}

fn stale(result: MappingResult, saved_at: DateTime<Utc>, scorer: &ConfidenceScorer) -> MappingResult {
    if result.strategy == Strategy::Cache {
        return result;
    }
    let confidence = scorer.score(Strategy::Cache, result.confidence, 0.0);
    let origin = result.strategy;
    MappingResult {
        confidence,
        strategy: Strategy::Cache,
        ..result
    }
    .with_warning(format!(
        "{}: reused {origin} result from run saved at {}",
        IssueKind::StaleCacheReuse,
        saved_at.to_rfc3339()
    ))
}

/// JSON file store for cache snapshots.
#[derive(Debug, Clone)]
pub struct CacheRepository {
    path: PathBuf,
}

impl CacheRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Writes the snapshot, creating parent directories as needed.
    pub fn save(&self, snapshot: &CacheSnapshot) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RepositoryError::Io {
                operation: "create directory for",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json =
            serde_json::to_string_pretty(snapshot).map_err(|source| {
                RepositoryError::Serialization {
                    path: self.path.clone(),
                    source,
                }
            })?;
        fs::write(&self.path, json).map_err(|source| RepositoryError::Io {
            operation: "write",
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), entries = snapshot.entries.len(), "saved cache snapshot");
        Ok(())
    }

    /// Reads the snapshot. Returns `None` if the file does not exist.
    pub fn load(&self) -> Result<Option<CacheSnapshot>, RepositoryError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| RepositoryError::Io {
            operation: "read",
            path: self.path.clone(),
            source,
        })?;
        let snapshot: CacheSnapshot =
            serde_json::from_str(&contents).map_err(|source| RepositoryError::Deserialization {
                path: self.path.clone(),
                source,
            })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RepositoryError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
                path: self.path.clone(),
            });
        }
        Ok(Some(snapshot))
    }
}
