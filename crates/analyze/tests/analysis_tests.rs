//! Integration tests for the filter consistency checker.
//!
//! Documents are built with `serde_json::json!` and driven through the
//! public `check` API, exactly as an editor would submit them.

use filtercheck_analyze::{check, check_with, CheckReport, Severity};
use filtercheck_core::{CheckerConfig, ConfigError};
use serde_json::{json, Value};

fn run(conditions: Value) -> CheckReport {
    check(&json!({ "conditions": conditions })).unwrap_or_else(|e| {
        panic!("check failed: {}", e);
    })
}

fn cond(property: &str, operator: &str, value: Value) -> Value {
    json!({"property": property, "operator": operator, "value": value})
}

fn codes(report: &CheckReport) -> Vec<&'static str> {
    report.codes()
}

// ──────────────────────────────────────────────
// Numeric ranges
// ──────────────────────────────────────────────

#[test]
fn test_empty_filter_is_clean() {
    let report = run(json!([]));
    assert!(report.diagnostics.is_empty());
    assert!(!report.blocks_save());
}

#[test]
fn test_range_contradiction() {
    let report = run(json!([
        cond("price", ">", json!(100)),
        cond("price", "<", json!(50)),
    ]));
    assert_eq!(codes(&report), vec!["numeric-range-empty"]);
    assert!(report.blocks_save());
    let message = &report.diagnostics[0].message;
    assert!(message.contains("price > 100"), "{}", message);
    assert!(message.contains("price < 50"), "{}", message);
}

#[test]
fn test_touching_bounds_are_satisfiable() {
    let report = run(json!([
        cond("price", ">=", json!(50)),
        cond("price", "<=", json!(50)),
    ]));
    assert!(!report.blocks_save(), "{:?}", report.diagnostics);
}

#[test]
fn test_open_bounds_on_the_same_value() {
    let report = run(json!([
        cond("price", ">", json!(50)),
        cond("price", "<=", json!(50)),
    ]));
    assert_eq!(codes(&report), vec!["numeric-range-empty"]);
}

#[test]
fn test_between_normalizes_reversed_bounds() {
    let reversed = run(json!([
        {"property": "price", "operator": "between", "value": 50, "value2": 10},
        cond("price", "=", json!(30)),
    ]));
    assert!(reversed.diagnostics.is_empty(), "{:?}", reversed.diagnostics);
}

#[test]
fn test_disjoint_betweens() {
    let report = run(json!([
        cond("weight", "between", json!([1, 5])),
        cond("weight", "between", json!([10, 20])),
    ]));
    assert_eq!(codes(&report), vec!["numeric-range-empty"]);
}

#[test]
fn test_equals_outside_range() {
    let report = run(json!([
        cond("price", "between", json!([10, 20])),
        cond("price", "equals", json!("25")),
    ]));
    assert_eq!(codes(&report), vec!["numeric-range-empty"]);
    assert!(report.diagnostics[0].message.contains("price = 25"));
}

#[test]
fn test_not_in_removes_every_allowed_point() {
    let report = run(json!([
        cond("stock_quantity", "in", json!("1, 2")),
        cond("stock_quantity", "not_in", json!([1, 2])),
    ]));
    assert_eq!(codes(&report), vec!["numeric-range-empty"]);
}

#[test]
fn test_integral_quantity_has_no_room_between_neighbours() {
    let report = run(json!([
        cond("stock_quantity", ">", json!(4)),
        cond("stock_quantity", "<", json!(5)),
    ]));
    assert_eq!(codes(&report), vec!["numeric-range-empty"]);
}

#[test]
fn test_rating_above_five_conflicts_with_catalog() {
    let report = run(json!([cond("average_rating", ">", json!(5))]));
    assert_eq!(codes(&report), vec!["numeric-range-empty"]);
}

// ──────────────────────────────────────────────
// Enumerations, booleans, text
// ──────────────────────────────────────────────

#[test]
fn test_enum_exhaustion_is_reported_once_under_the_specific_code() {
    let report = run(json!([
        cond("product_type", "in", json!(["simple", "variable"])),
        cond("product_type", "not_in", json!("simple,variable")),
    ]));
    assert_eq!(codes(&report), vec!["catalog-product-type-exhausted"]);
}

#[test]
fn test_enum_exhaustion_without_a_specific_rule() {
    let report = run(json!([
        cond("backorders", "equals", json!("yes")),
        cond("backorders", "equals", json!("no")),
    ]));
    assert_eq!(codes(&report), vec!["enum-no-value-remains"]);
}

#[test]
fn test_excluding_every_product_type_is_impossible() {
    let report = run(json!([cond(
        "product_type",
        "not_in",
        json!(["simple", "variable", "grouped", "external"])
    )]));
    assert_eq!(codes(&report), vec!["catalog-product-type-exhausted"]);
    assert!(report.blocks_save());
}

#[test]
fn test_excluding_some_product_types_is_fine() {
    let report = run(json!([cond(
        "product_type",
        "not_in",
        json!(["simple", "variable"])
    )]));
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn test_single_boolean_condition_is_clean() {
    let report = run(json!([cond("featured", "=", json!(true))]));
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn test_enum_values_are_case_insensitive() {
    let report = run(json!([
        cond("stock_status", "equals", json!("InStock")),
        cond("stock_status", "in", json!(["instock", "onbackorder"])),
    ]));
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn test_boolean_contradiction_through_exclude_mode() {
    let report = run(json!([
        cond("featured", "equals", json!("yes")),
        {"property": "featured", "operator": "equals", "value": true, "mode": "exclude"},
    ]));
    assert_eq!(codes(&report), vec!["boolean-contradiction"]);
}

#[test]
fn test_text_equals_against_contains() {
    let report = run(json!([
        cond("sku", "equals", json!("TSHIRT-RED")),
        cond("sku", "contains", json!("blue")),
    ]));
    assert_eq!(codes(&report), vec!["text-unsatisfiable"]);
}

#[test]
fn test_text_coherent_patterns() {
    let report = run(json!([
        cond("sku", "starts_with", json!("TS")),
        cond("sku", "starts_with", json!("TSHIRT")),
        cond("sku", "ends_with", json!("-RED")),
        cond("sku", "not_contains", json!("BLUE")),
    ]));
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn test_text_case_sensitivity_is_configurable() {
    let document = json!({"conditions": [
        cond("sku", "equals", json!("ABC")),
        cond("sku", "starts_with", json!("abc")),
    ]});
    assert!(check(&document).unwrap().diagnostics.is_empty());

    let config = CheckerConfig {
        case_sensitive_text: true,
        ..CheckerConfig::default()
    };
    let report = check_with(&document, &config).unwrap();
    assert_eq!(codes(&report), vec!["text-unsatisfiable"]);
}

// ──────────────────────────────────────────────
// Dates
// ──────────────────────────────────────────────

#[test]
fn test_date_only_values_cover_the_whole_day() {
    let report = run(json!([
        cond("date_created", "equals", json!("2024-03-01")),
        cond("date_created", ">=", json!("2024-03-01 18:00:00")),
    ]));
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    let report = run(json!([
        cond("date_created", ">", json!("2024-03-01")),
        cond("date_created", "<", json!("2024-03-02")),
    ]));
    assert_eq!(codes(&report), vec!["date-range-empty"]);
}

#[test]
fn test_broad_date_window_warns() {
    let report = run(json!([cond(
        "date_created",
        "between",
        json!(["2000-01-01", "2024-12-31"])
    )]));
    assert_eq!(codes(&report), vec!["date-range-broad"]);
    assert!(!report.blocks_save());
}

// ──────────────────────────────────────────────
// Cross-property rules
// ──────────────────────────────────────────────

#[test]
fn test_sale_ends_before_it_starts() {
    let report = run(json!([
        cond("date_on_sale_from", ">=", json!("2024-06-01")),
        cond("date_on_sale_to", "<", json!("2024-05-01")),
    ]));
    assert_eq!(codes(&report), vec!["temporal-sale-end-before-start"]);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(
        diagnostic.properties,
        vec!["date_on_sale_from", "date_on_sale_to"]
    );
    assert_eq!(diagnostic.args.len(), 2);
}

#[test]
fn test_virtual_product_with_weight() {
    let report = run(json!([
        cond("virtual", "equals", json!(true)),
        cond("weight", ">", json!(0.5)),
    ]));
    assert_eq!(codes(&report), vec!["physical-virtual-has-dimensions"]);
}

#[test]
fn test_warnings_do_not_block() {
    let report = run(json!([
        cond("manage_stock", "equals", json!(false)),
        cond("stock_quantity", ">", json!(10)),
    ]));
    assert_eq!(codes(&report), vec!["stock-quantity-without-management"]);
    assert_eq!(report.diagnostics[0].severity, Severity::Warning);
    assert!(!report.blocks_save());
}

// ──────────────────────────────────────────────
// Extreme magnitudes
// ──────────────────────────────────────────────

const DECIMAL_MAX: &str = "79228162514264337593543950335";
const DECIMAL_MIN: &str = "-79228162514264337593543950335";

#[test]
fn test_bounds_at_the_decimal_limit_do_not_abort_the_check() {
    let report = run(json!([cond("stock_quantity", ">", json!(DECIMAL_MAX))]));
    assert_eq!(report.conditions_checked, 1);

    let report = run(json!([cond("review_count", ">", json!(DECIMAL_MAX))]));
    assert_eq!(report.conditions_checked, 1);

    let report = run(json!([
        cond("menu_order", ">=", json!(DECIMAL_MIN)),
        cond("menu_order", "<=", json!(DECIMAL_MAX)),
    ]));
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn test_unrepresentable_width_is_broad() {
    let mut config = CheckerConfig::default();
    config
        .broad_ranges
        .insert("menu_order".to_string(), rust_decimal::Decimal::from(10));
    let document = json!({"conditions": [
        cond("menu_order", ">=", json!(DECIMAL_MIN)),
        cond("menu_order", "<=", json!(DECIMAL_MAX)),
    ]});
    let report = check_with(&document, &config).unwrap();
    assert_eq!(codes(&report), vec!["numeric-range-broad"]);
}

// ──────────────────────────────────────────────
// Combinator, configuration errors
// ──────────────────────────────────────────────

#[test]
fn test_any_combinator_bypasses_analysis() {
    let report = check(&json!({
        "combinator": "any",
        "conditions": [cond("price", ">", json!(100)), cond("price", "<", json!(50))]
    }))
    .unwrap();
    assert!(report.skipped);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_configuration_errors_name_the_condition() {
    let err = check(&json!({"conditions": [
        cond("price", ">", json!(1)),
        cond("price", ">", json!("a lot")),
    ]}))
    .unwrap_err();
    assert!(matches!(err, ConfigError::MalformedValue { index: 1, .. }));
    assert_eq!(err.condition_index(), Some(1));
}

#[test]
fn test_too_many_conditions() {
    let config = CheckerConfig {
        max_conditions: 1,
        ..CheckerConfig::default()
    };
    let document = json!({"conditions": [
        cond("price", ">", json!(1)),
        cond("price", "<", json!(9)),
    ]});
    let err = check_with(&document, &config).unwrap_err();
    assert_eq!(err, ConfigError::TooManyConditions { count: 2, max: 1 });
}

// ──────────────────────────────────────────────
// Algebraic properties
// ──────────────────────────────────────────────

fn sample() -> Vec<Value> {
    vec![
        cond("price", ">", json!(100)),
        cond("price", "<", json!(50)),
        cond("sku", "starts_with", json!("AB")),
        cond("sku", "starts_with", json!("XY")),
        cond("manage_stock", "equals", json!(false)),
        cond("backorders", "equals", json!("notify")),
        cond("weight", "between", json!([0, 100000])),
        cond("review_count", ">=", json!(0)),
        cond("price", ">=", json!(0)),
        cond("average_rating", "<=", json!(5)),
        cond("average_rating", "<=", json!(3)),
    ]
}

fn report_json(conditions: Vec<Value>) -> Value {
    serde_json::to_value(run(Value::Array(conditions))).unwrap()
}

#[test]
fn test_permutations_produce_identical_reports() {
    let forward = report_json(sample());
    let mut reversed = sample();
    reversed.reverse();
    assert_eq!(forward, report_json(reversed));

    let mut rotated = sample();
    rotated.rotate_left(3);
    assert_eq!(forward, report_json(rotated));
}

#[test]
fn test_vacuous_findings_do_not_depend_on_order() {
    let pairs = [
        (cond("price", ">=", json!(0)), cond("price", ">=", json!(10))),
        (
            cond("average_rating", "<=", json!(5)),
            cond("average_rating", "<=", json!(3)),
        ),
    ];
    for (catalog_tie, narrower) in pairs {
        let forward = run(json!([catalog_tie.clone(), narrower.clone()]));
        let reversed = run(json!([narrower, catalog_tie]));
        assert_eq!(codes(&forward), vec!["condition-vacuous"]);
        assert_eq!(forward.diagnostics, reversed.diagnostics);
    }
}

#[test]
fn test_duplicated_conditions_change_nothing() {
    let once = run(Value::Array(sample()));
    let mut doubled = sample();
    doubled.extend(sample());
    let twice = run(Value::Array(doubled));
    assert_eq!(once.diagnostics, twice.diagnostics);
}

#[test]
fn test_impossible_findings_survive_added_conditions() {
    let base = run(Value::Array(sample()));
    let impossible: Vec<_> = base
        .diagnostics
        .iter()
        .filter(|d| d.is_impossible())
        .map(|d| (d.code, d.properties.clone()))
        .collect();
    assert!(!impossible.is_empty());

    let mut extended = sample();
    extended.push(cond("price", "=", json!(75)));
    extended.push(cond("sku", "contains", json!("-")));
    extended.push(cond("stock_status", "not_equals", json!("outofstock")));
    let grown = run(Value::Array(extended));
    for (code, properties) in impossible {
        assert!(
            grown
                .diagnostics
                .iter()
                .any(|d| d.code == code && d.properties == properties),
            "{} on {:?} disappeared",
            code,
            properties
        );
    }
}
