//! Similarity catalog: canonical target names used by fuzzy matching.

use partmap_model::RuleCategory;
use rapidfuzz::distance::levenshtein;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::utils::strip_library_prefix;

const DEFAULT_SYMBOLS: &[&str] = &[
    "Device:R",
    "Device:R_Small",
    "Device:R_Variable",
    "Device:R_Potentiometer",
    "Device:C",
    "Device:C_Small",
    "Device:C_Polarized",
    "Device:C_Variable",
    "Device:L",
    "Device:L_Small",
    "Device:L_Core_Ferrite",
    "Device:D",
    "Device:D_Zener",
    "Device:D_Schottky",
    "Device:Q_NPN_BCE",
    "Device:Q_PNP_BCE",
    "Device:Q_NMOS_GSD",
    "Device:Q_PMOS_GSD",
    "Device:LED",
    "Device:Fuse",
    "Device:Crystal",
    "Device:Resonator",
    "Amplifier_Operational:LM358",
    "Amplifier_Operational:LM324",
    "Amplifier_Operational:TL071",
    "Amplifier_Operational:TL072",
    "Amplifier_Operational:TL074",
];

const DEFAULT_FOOTPRINTS: &[&str] = &[
    "Resistor_SMD:R_0201_0603Metric",
    "Resistor_SMD:R_0402_1005Metric",
    "Resistor_SMD:R_0603_1608Metric",
    "Resistor_SMD:R_0805_2012Metric",
    "Resistor_SMD:R_1206_3216Metric",
    "Resistor_SMD:R_1210_3225Metric",
    "Resistor_SMD:R_2512_6332Metric",
    "Capacitor_SMD:C_0201_0603Metric",
    "Capacitor_SMD:C_0402_1005Metric",
    "Capacitor_SMD:C_0603_1608Metric",
    "Capacitor_SMD:C_0805_2012Metric",
    "Capacitor_SMD:C_1206_3216Metric",
    "Capacitor_SMD:C_1210_3225Metric",
    "Inductor_SMD:L_0402_1005Metric",
    "Inductor_SMD:L_0603_1608Metric",
    "Inductor_SMD:L_0805_2012Metric",
    "Inductor_SMD:L_1206_3216Metric",
    "Package_SO:SOIC-8_3.9x4.9mm_P1.27mm",
    "Package_SO:SOIC-14_3.9x8.7mm_P1.27mm",
    "Package_SO:SOIC-16_3.9x9.9mm_P1.27mm",
    "Package_SO:TSSOP-14_4.4x5mm_P0.65mm",
    "Package_SO:TSSOP-20_4.4x6.5mm_P0.65mm",
    "Package_TO_SOT_SMD:SOT-23",
    "Package_TO_SOT_SMD:SOT-23-5",
    "Package_TO_SOT_SMD:SOT-23-6",
    "Package_TO_SOT_SMD:SOT-223-3_TabPin2",
    "Package_TO_SOT_SMD:TO-252-2",
    "Package_QFP:LQFP-32_7x7mm_P0.8mm",
    "Package_QFP:LQFP-48_7x7mm_P0.5mm",
    "Package_QFP:LQFP-64_10x10mm_P0.5mm",
];

const DEFAULT_CATEGORIES: &[&str] = &[
    "Passive Components",
    "Semiconductor",
    "Integrated Circuits",
    "Electromechanical",
    "Uncategorized",
];

/// Fixed lists of canonical names, one per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityCatalog {
    pub symbols: Vec<String>,
    pub footprints: Vec<String>,
    pub categories: Vec<String>,
}

impl Default for SimilarityCatalog {
    fn default() -> Self {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(ToString::to_string).collect()
        }
        Self {
            symbols: owned(DEFAULT_SYMBOLS),
            footprints: owned(DEFAULT_FOOTPRINTS),
            categories: owned(DEFAULT_CATEGORIES),
        }
    }
}

/// Best catalog entry for an identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogMatch<'a> {
    pub name: &'a str,
    pub similarity: f32,
}

impl SimilarityCatalog {
    /// A catalog with no entries; fuzzy matching never fires.
    pub fn empty() -> Self {
        Self {
            symbols: Vec::new(),
            footprints: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn names(&self, category: RuleCategory) -> &[String] {
        match category {
            RuleCategory::Symbol => &self.symbols,
            RuleCategory::Footprint => &self.footprints,
            RuleCategory::Category => &self.categories,
        }
    }

    /// Rejects blank entries.
    pub fn validate(&self) -> Result<()> {
        for category in RuleCategory::ALL {
            if let Some(index) = self
                .names(category)
                .iter()
                .position(|name| name.trim().is_empty())
            {
                return Err(EngineError::EmptyCatalogEntry {
                    category,
                    position: index + 1,
                });
            }
        }
        Ok(())
    }

    /// Finds the most similar entry. Equal scores keep the earlier entry.
    pub fn best_match(&self, category: RuleCategory, identifier: &str) -> Option<CatalogMatch<'_>> {
        let mut best: Option<CatalogMatch<'_>> = None;
        for name in self.names(category) {
            let similarity = similarity(identifier, name);
            if best.is_none_or(|current| similarity > current.similarity) {
                best = Some(CatalogMatch {
                    name: name.as_str(),
                    similarity,
                });
            }
        }
        best
    }
}

/// Normalised Levenshtein similarity between an identifier and a catalog
/// name, in `[0, 1]`.
///
/// Library prefixes are ignored on the identifier. The name is compared both
/// whole and without its prefix; the higher score counts.
pub fn similarity(identifier: &str, name: &str) -> f32 {
    let identifier = strip_library_prefix(identifier.trim()).to_lowercase();
    if identifier.is_empty() {
        return 0.0;
    }
    let full = name.trim().to_lowercase();
    let short = strip_library_prefix(&full);

    let whole = levenshtein::normalized_similarity(identifier.chars(), full.chars());
    let bare = levenshtein::normalized_similarity(identifier.chars(), short.chars());
    whole.max(bare).clamp(0.0, 1.0) as f32
}
