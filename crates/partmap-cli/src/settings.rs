//! Settings file (`--config`).
//!
//! ```json
//! {
//!   "engine": { "min_acceptance": 0.6, "workers": 4 },
//!   "catalog": { "symbols": ["Device:R", "Device:C"] },
//!   "field_names": [{ "source": "Comment", "target": "Value" }]
//! }
//! ```
//!
//! Every section is optional; a missing section keeps the built-in defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use partmap_map::{EngineConfig, FieldTable, SimilarityCatalog};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub catalog: SimilarityCatalog,
    pub field_names: FieldTable,
}

impl Settings {
    /// Reads the settings file, or returns defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("read settings {}", path.display()))?;
        let settings: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse settings {}", path.display()))?;
        settings
            .engine
            .validate()
            .with_context(|| format!("invalid engine settings in {}", path.display()))?;
        Ok(settings)
    }
}
