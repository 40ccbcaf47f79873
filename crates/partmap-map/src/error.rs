//! Error types for engine construction and cache persistence.

use std::path::PathBuf;

use partmap_model::{RuleCategory, RuleValidationError};
use thiserror::Error;

/// Errors raised while assembling a mapping engine.
///
/// All of these are fatal: an engine is never built from partially valid
/// input.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error(transparent)]
    Rules(#[from] RuleValidationError),

    #[error("unknown strategy '{name}' (registered: {registered})")]
    UnknownStrategy { name: String, registered: String },

    #[error("invalid engine setting {setting}: {reason}")]
    InvalidConfig {
        setting: &'static str,
        reason: String,
    },

    #[error("{category} catalog entry {position} is empty")]
    EmptyCatalogEntry {
        category: RuleCategory,
        position: usize,
    },

    #[error("field table entry {position} has an empty {side} field name")]
    EmptyFieldName {
        position: usize,
        side: &'static str,
    },
}

impl EngineError {
    pub(crate) fn invalid(setting: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            setting,
            reason: reason.into(),
        }
    }
}

/// Errors from reading or writing cache snapshots.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to {operation} cache snapshot: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize cache snapshot: {path}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse cache snapshot: {path}")]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache snapshot version {found} is not supported (expected {expected}): {path}")]
    UnsupportedVersion {
        found: u32,
        expected: u32,
        path: PathBuf,
    },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
