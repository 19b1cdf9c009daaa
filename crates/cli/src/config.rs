//! Checker settings file for `filtercheck check --config`.
//!
//! Every key is optional; omitted keys keep their defaults.
//!
//! ```toml
//! max_conditions = 50
//! case_sensitive_text = true
//! report_vacuous = false
//!
//! [broad_ranges]
//! weight = 100
//! date_created = 365
//! ```

use std::path::Path;

use filtercheck_core::{CheckerConfig, Registry};

/// Read and validate a settings file.
///
/// Unknown keys and unknown property names under `[broad_ranges]` are
/// rejected.
pub(crate) fn load(path: &Path, registry: &Registry) -> Result<CheckerConfig, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading config '{}': {}", path.display(), e))?;
    let config = parse(&contents)
        .map_err(|e| format!("error parsing config '{}': {}", path.display(), e))?;
    config
        .validate(registry)
        .map_err(|e| format!("invalid config '{}': {}", path.display(), e))?;
    Ok(config)
}

fn parse(contents: &str) -> Result<CheckerConfig, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filtercheck_core::registry;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse("").unwrap(), CheckerConfig::default());
    }

    #[test]
    fn overrides_are_read() {
        let config = parse(
            "case_sensitive_text = true\n\n[broad_ranges]\nweight = 100\nprice = \"2500.50\"\n",
        )
        .unwrap();
        assert!(config.case_sensitive_text);
        assert_eq!(config.broad_ranges.len(), 2);
        assert_eq!(config.broad_ranges["weight"].to_string(), "100");
        assert_eq!(config.broad_ranges["price"].to_string(), "2500.50");
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(parse("max_condition = 3").is_err());
    }

    #[test]
    fn unknown_property_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("unknown.toml");
        std::fs::write(&path, "[broad_ranges]\ncolour = 5\n").unwrap();
        let err = load(&path, registry::standard()).unwrap_err();
        assert!(err.contains("colour"), "{}", err);
    }
}
