//! Text normalisation shared by the matcher stages.

/// Separator between the identifier and context parts of a cache key.
const KEY_SEPARATOR: char = '\u{1f}';

/// Normalises an identifier for comparison: trimmed and lower-cased.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalises free text by lowercasing and collapsing separators to single spaces.
pub fn normalize_text(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-', '.', '/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the cache key for a record.
///
/// The normalised identifier comes first, then each context slot normalised
/// the same way after a unit separator. Empty slots keep their position, so
/// the same text in different slots yields different keys.
pub fn cache_key(identifier: &str, context: &[&str]) -> String {
    let mut key = normalize_key(identifier);
    for text in context {
        key.push(KEY_SEPARATOR);
        key.push_str(&normalize_key(text));
    }
    key
}

/// Strips a `Library:` prefix from a reference name.
pub fn strip_library_prefix(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((_, rest)) if !rest.trim().is_empty() => rest,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_trims_and_lowercases() {
        assert_eq!(normalize_key("  RES10K "), "res10k");
    }

    #[test]
    fn normalize_text_collapses_separators() {
        assert_eq!(normalize_text(" Thick_Film-Resistor  0603 "), "thick film resistor 0603");
    }

    #[test]
    fn cache_key_normalises_every_slot() {
        assert_eq!(cache_key(" R10K ", &[]), "r10k");
        assert_eq!(cache_key("R10K", &["", "  "]), "r10k\u{1f}\u{1f}");
        assert_eq!(
            cache_key("r10k", &[" Resistor ", ""]),
            cache_key(" R10K", &["RESISTOR", " "])
        );
        assert_ne!(cache_key("R10K", &["x", ""]), cache_key("R10K", &["", "x"]));
    }

    #[test]
    fn strip_library_prefix_keeps_bare_names() {
        assert_eq!(strip_library_prefix("Device:R"), "R");
        assert_eq!(strip_library_prefix("R_0603"), "R_0603");
        assert_eq!(strip_library_prefix("Device:"), "Device:");
    }
}
