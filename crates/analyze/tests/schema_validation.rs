//! Validates serialized check reports against docs/report-schema.json.

use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn load_validator() -> jsonschema::Validator {
    let schema_path = workspace_root().join("docs/report-schema.json");
    let schema_src = std::fs::read_to_string(&schema_path)
        .unwrap_or_else(|e| panic!("Failed to read schema at {}: {}", schema_path.display(), e));
    let schema_value: serde_json::Value = serde_json::from_str(&schema_src).unwrap();
    jsonschema::validator_for(&schema_value)
        .unwrap_or_else(|e| panic!("Failed to compile schema: {}", e))
}

#[test]
fn validate_fixture_reports_against_schema() {
    let validator = load_validator();
    let fixtures = workspace_root().join("fixtures");

    let mut paths: Vec<_> = std::fs::read_dir(&fixtures)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    paths.sort();

    let mut tested = 0usize;
    let mut failures = Vec::new();
    for path in &paths {
        let src = std::fs::read_to_string(path).unwrap();
        let document: serde_json::Value = serde_json::from_str(&src).unwrap();
        // Fixtures that fail configuration produce no report.
        let Ok(report) = filtercheck_analyze::check(&document) else {
            continue;
        };
        let instance = serde_json::to_value(&report).unwrap();
        let errors: Vec<String> = validator
            .iter_errors(&instance)
            .map(|e| e.to_string())
            .collect();
        if !errors.is_empty() {
            failures.push(format!("{}: {}", path.display(), errors.join("; ")));
        }
        tested += 1;
    }

    assert!(tested > 0, "No fixture reports produced -- check paths");
    assert!(
        failures.is_empty(),
        "Report validation failed for {} of {} fixtures:\n{}",
        failures.len(),
        tested,
        failures.join("\n")
    );
}

#[test]
fn every_diagnostic_kind_matches_schema() {
    let validator = load_validator();
    let document = serde_json::json!({"conditions": [
        {"property": "price", "operator": ">", "value": 100},
        {"property": "price", "operator": "<", "value": 50},
        {"property": "weight", "operator": "between", "value": [0, 90000]},
        {"property": "review_count", "operator": ">=", "value": 0},
        {"property": "sku", "operator": "starts_with", "value": "A"},
        {"property": "sku", "operator": "starts_with", "value": "B"},
        {"property": "featured", "operator": "equals", "value": true},
        {"property": "featured", "operator": "equals", "value": false},
        {"property": "virtual", "operator": "equals", "value": true},
        {"property": "height", "operator": ">", "value": 2}
    ]});
    let report = filtercheck_analyze::check(&document).unwrap();
    assert!(report.count(filtercheck_analyze::Severity::Impossible) >= 3);
    assert!(report.count(filtercheck_analyze::Severity::Warning) >= 1);
    assert!(report.count(filtercheck_analyze::Severity::Info) >= 1);

    let instance = serde_json::to_value(&report).unwrap();
    if let Err(error) = validator.validate(&instance) {
        panic!("report does not match schema: {}\n{:#}", error, instance);
    }
}
