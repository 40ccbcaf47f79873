//! Package designations found in footprint names and free text.

use std::sync::LazyLock;

use regex::Regex;

static SOT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^A-Z])SOT-?(223|23)(?:-(\d{1,2}))?(?:[^0-9]|$)")
        .expect("Invalid SOT package regex")
});

static FAMILY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^A-Z])(SOIC|TSSOP|LQFP|QFN|QFP|DIP|SOD|TO)-?(\d{1,3})(?:[^0-9]|$)")
        .expect("Invalid package family regex")
});

static CHIP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])(0201|0402|0603|0805|1206|1210|1812|2010|2220|2512)(?:[^0-9]|$)")
        .expect("Invalid chip size regex")
});

/// Extracts a normalised package code such as `0603`, `SOT-23-5` or
/// `SOIC-8` from `text`.
pub fn extract_package_code(text: &str) -> Option<String> {
    if let Some(caps) = SOT_PATTERN.captures(text) {
        let mut code = format!("SOT-{}", &caps[1]);
        if let Some(pins) = caps.get(2) {
            code.push('-');
            code.push_str(pins.as_str());
        }
        return Some(code);
    }
    if let Some(caps) = FAMILY_PATTERN.captures(text) {
        return Some(format!("{}-{}", caps[1].to_uppercase(), &caps[2]));
    }
    CHIP_PATTERN
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// First package code found among `texts`, in order.
pub fn first_package_code<S>(texts: &[S]) -> Option<String>
where
    S: AsRef<str>,
{
    texts
        .iter()
        .find_map(|text| extract_package_code(text.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chip_sizes() {
        assert_eq!(extract_package_code("RES_0603_HD").as_deref(), Some("0603"));
        assert_eq!(extract_package_code("0805").as_deref(), Some("0805"));
        assert_eq!(extract_package_code("C1206-X7R").as_deref(), Some("1206"));
        assert_eq!(extract_package_code("106030"), None);
    }

    #[test]
    fn sot_variants() {
        assert_eq!(extract_package_code("SOT23").as_deref(), Some("SOT-23"));
        assert_eq!(extract_package_code("sot-23-5").as_deref(), Some("SOT-23-5"));
        assert_eq!(extract_package_code("REG_SOT223").as_deref(), Some("SOT-223"));
    }

    #[test]
    fn pin_count_families() {
        assert_eq!(extract_package_code("SOIC8_N").as_deref(), Some("SOIC-8"));
        assert_eq!(extract_package_code("tssop-20").as_deref(), Some("TSSOP-20"));
        assert_eq!(extract_package_code("MCU LQFP-48").as_deref(), Some("LQFP-48"));
        assert_eq!(extract_package_code("QFN-32").as_deref(), Some("QFN-32"));
        assert_eq!(extract_package_code("TO-220").as_deref(), Some("TO-220"));
        assert_eq!(extract_package_code("SOD-123").as_deref(), Some("SOD-123"));
        assert_eq!(extract_package_code("DIP-14").as_deref(), Some("DIP-14"));
        assert_eq!(extract_package_code("AUTO-220"), None);
        assert_eq!(extract_package_code("Thick film resistor"), None);
    }

    #[test]
    fn first_code_wins() {
        let texts = ["RES10K", "", "Resistor 0402 1%"];
        assert_eq!(first_package_code(&texts).as_deref(), Some("0402"));
    }
}
