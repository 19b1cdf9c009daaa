use std::path::Path;

use filtercheck_core::{parse_document, registry, CheckerConfig, FilterDocument};

use super::read_json;
use crate::{report_error, OutputFormat};

static FILTER_SCHEMA_STR: &str = include_str!("../../../../docs/filter-schema.json");

/// Structural check against the filter schema, then a registry check of
/// every condition. Content is not analyzed.
pub(crate) fn cmd_validate(file: &Path, output: OutputFormat, quiet: bool) -> i32 {
    let schema: serde_json::Value = match serde_json::from_str(FILTER_SCHEMA_STR) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("internal error: failed to parse embedded filter schema: {}", e);
            report_error(&msg, output, quiet);
            return 1;
        }
    };
    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("internal error: failed to compile schema: {}", e);
            report_error(&msg, output, quiet);
            return 1;
        }
    };

    let doc = match read_json(file) {
        Ok(v) => v,
        Err(msg) => {
            report_error(&msg, output, quiet);
            return 1;
        }
    };

    let mut errors: Vec<String> = validator
        .iter_errors(&doc)
        .map(|e| format!("{}", e))
        .collect();

    if errors.is_empty() {
        let parsed = FilterDocument::from_json(&doc).and_then(|document| {
            parse_document(&document, registry::standard(), &CheckerConfig::default())
        });
        if let Err(e) = parsed {
            errors.push(e.to_string());
        }
    }

    if errors.is_empty() {
        if !quiet {
            match output {
                OutputFormat::Text => println!("valid"),
                OutputFormat::Json => println!("{}", serde_json::json!({ "valid": true })),
            }
        }
        return 0;
    }

    match output {
        OutputFormat::Text => {
            if !quiet {
                eprintln!("invalid filter document");
                for err in &errors {
                    eprintln!("  - {}", err);
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "valid": false,
                "errors": errors
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }
    1
}
