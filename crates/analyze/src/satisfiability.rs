//! Satisfiability checking of aggregated per-property constraints.
//!
//! Each kind has exactly one emptiness code. Adding conditions can change
//! the reason (and message) but never the code, so a filter that is
//! impossible stays reported under the same code as it grows.

use filtercheck_core::{CheckerConfig, Timestamp};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeSet;
use std::fmt::Display;
use time::PrimitiveDateTime;

use crate::aggregate::{
    first, join, next_second, step_up, AggregatedConstraint, Aggregation, BooleanConstraint,
    Cited, DateRange, Emptiness, EnumConstraint, Interval, Limit, NumericRange, Patterns,
    Restriction, TextConstraint,
};
use crate::diagnostic::{Diagnostic, Severity};

pub const NUMERIC_RANGE_EMPTY: &str = "numeric-range-empty";
pub const DATE_RANGE_EMPTY: &str = "date-range-empty";
pub const ENUM_NO_VALUE_REMAINS: &str = "enum-no-value-remains";
pub const BOOLEAN_CONTRADICTION: &str = "boolean-contradiction";
pub const TEXT_UNSATISFIABLE: &str = "text-unsatisfiable";
pub const NUMERIC_RANGE_BROAD: &str = "numeric-range-broad";
pub const DATE_RANGE_BROAD: &str = "date-range-broad";
pub const CONDITION_VACUOUS: &str = "condition-vacuous";

/// Check every aggregated property. Output order follows property order.
pub fn check(aggregated: &Aggregation, config: &CheckerConfig) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for constraint in aggregated.values() {
        let property = constraint.property.as_str();
        match &constraint.restriction {
            Restriction::Numeric(numeric) => check_numeric(property, numeric, &mut out),
            Restriction::Date(date) => check_date(property, date, &mut out),
            Restriction::Enum(enumeration) => out.extend(check_enum(property, enumeration)),
            Restriction::Boolean(boolean) => out.extend(check_boolean(property, boolean)),
            Restriction::Text(text) => out.extend(check_text(property, text)),
        }
        if config.report_vacuous {
            out.extend(vacuous(constraint));
        }
    }
    out
}

// ──────────────────────────────────────────────
// Ranges
// ──────────────────────────────────────────────

fn check_numeric(property: &str, numeric: &NumericRange, out: &mut Vec<Diagnostic>) {
    let step = numeric.step;
    match numeric.range.emptiness(|v| step_up(*v, step)) {
        Some(emptiness) => out.push(range_empty(
            NUMERIC_RANGE_EMPTY,
            property,
            &numeric.range,
            emptiness,
            |v: &Decimal| v.normalize().to_string(),
        )),
        None => {
            // Saturates: a span too wide to represent is broad by definition.
            let width =
                |lo: &Decimal, hi: &Decimal| hi.checked_sub(*lo).unwrap_or(Decimal::MAX);
            if let Some((min, max, width)) = broad_width(&numeric.range, width) {
                if let Some(threshold) = numeric.broad_threshold.filter(|t| width > *t) {
                    out.push(range_broad(
                        NUMERIC_RANGE_BROAD,
                        property,
                        width.normalize(),
                        min.value.normalize(),
                        max.value.normalize(),
                        threshold.normalize(),
                    ));
                }
            }
        }
    }
}

fn check_date(property: &str, date: &DateRange, out: &mut Vec<Diagnostic>) {
    match date.range.emptiness(next_second) {
        Some(emptiness) => out.push(range_empty(
            DATE_RANGE_EMPTY,
            property,
            &date.range,
            emptiness,
            |v: &PrimitiveDateTime| Timestamp(*v).to_string(),
        )),
        None => {
            let days = |lo: &PrimitiveDateTime, hi: &PrimitiveDateTime| {
                Decimal::from((*hi - *lo).whole_days())
            };
            if let Some((min, max, width)) = broad_width(&date.range, days) {
                if let Some(threshold) = date.broad_threshold.filter(|t| width > *t) {
                    out.push(range_broad(
                        DATE_RANGE_BROAD,
                        property,
                        format!("{} days", width),
                        Timestamp(min.value),
                        Timestamp(max.value),
                        format!("{} days", threshold.normalize()),
                    ));
                }
            }
        }
    }
}

/// Width of a range whose bounds are both known and at least one of which
/// a condition set.
fn broad_width<T: Ord + Clone, W>(
    range: &Interval<T>,
    width: impl Fn(&T, &T) -> W,
) -> Option<(&Limit<T>, &Limit<T>, W)> {
    let (min, max) = range.bounds()?;
    if min.from_catalog && max.from_catalog {
        return None;
    }
    Some((min, max, width(&min.value, &max.value)))
}

fn range_broad(
    code: &'static str,
    property: &str,
    width: impl Display,
    min: impl Display,
    max: impl Display,
    threshold: impl Display,
) -> Diagnostic {
    Diagnostic::new(
        code,
        Severity::Warning,
        vec![property.to_string()],
        "{0} spans {1} (from {2} to {3}), wider than the expected {4}",
        vec![
            property.to_string(),
            width.to_string(),
            min.to_string(),
            max.to_string(),
            threshold.to_string(),
        ],
    )
    .with_details(json!({
        "reason": "range-broader-than-threshold",
        "min": min.to_string(),
        "max": max.to_string(),
    }))
}

fn range_empty<T: Ord + Clone>(
    code: &'static str,
    property: &str,
    range: &Interval<T>,
    emptiness: Emptiness<T>,
    render: impl Fn(&T) -> String,
) -> Diagnostic {
    let properties = vec![property.to_string()];
    match emptiness {
        Emptiness::Inverted { min, max } => Diagnostic::new(
            code,
            Severity::Impossible,
            properties,
            "No {0} satisfies both {1} and {2}",
            vec![property.to_string(), min.cited.clone(), max.cited.clone()],
        )
        .with_details(json!({
            "reason": "inverted-bounds",
            "min": render(&min.value),
            "max": render(&max.value),
            "conditions": [min.cited, max.cited],
        })),
        Emptiness::NoAllowedPoint { points } => {
            let mut cited: Cited = points.cited.clone();
            cited.extend(range.min.iter().chain(range.max.iter()).map(|l| l.cited.clone()));
            cited.extend(range.excluded.iter().map(|s| s.cited.clone()));
            let values: Vec<String> = points.values.iter().map(&render).collect();
            let diagnostic = if values.is_empty() {
                Diagnostic::new(
                    code,
                    Severity::Impossible,
                    properties,
                    "{1} leaves no {0} value to match",
                    vec![property.to_string(), join(&points.cited)],
                )
            } else {
                Diagnostic::new(
                    code,
                    Severity::Impossible,
                    properties,
                    "None of the values {1} allowed for {0} satisfies {2}",
                    vec![
                        property.to_string(),
                        format!("[{}]", values.join(", ")),
                        join(cited.iter().filter(|c| !points.cited.contains(*c))),
                    ],
                )
            };
            diagnostic
            .with_details(json!({
                "reason": "no-allowed-value",
                "allowed": values,
                "conditions": cited,
            }))
        }
        Emptiness::Covered { min, max, spans } => {
            let excluded: BTreeSet<&str> = spans.iter().map(|s| s.cited.as_str()).collect();
            let mut cited = vec![min.cited.clone(), max.cited.clone()];
            cited.extend(excluded.iter().map(|s| s.to_string()));
            Diagnostic::new(
                code,
                Severity::Impossible,
                properties,
                "Every {0} from {1} to {2} is excluded by {3}",
                vec![
                    property.to_string(),
                    render(&min.value),
                    render(&max.value),
                    join(&excluded),
                ],
            )
            .with_details(json!({
                "reason": "excluded-spans-cover-range",
                "min": render(&min.value),
                "max": render(&max.value),
                "conditions": cited,
            }))
        }
    }
}

// ──────────────────────────────────────────────
// Enumerations and booleans
// ──────────────────────────────────────────────

fn check_enum(property: &str, enumeration: &EnumConstraint) -> Option<Diagnostic> {
    if !enumeration.remaining().is_empty() {
        return None;
    }
    let mut cited = Cited::new();
    let reason = match &enumeration.allowed {
        Some(allowed) if allowed.values.is_empty() => {
            cited.extend(allowed.cited.iter().cloned());
            "allowed-set-empty"
        }
        Some(allowed) => {
            cited.extend(allowed.cited.iter().cloned());
            for value in &allowed.values {
                if let Some(by) = enumeration.excluded.get(value) {
                    cited.insert(first(by).to_string());
                }
            }
            "all-allowed-excluded"
        }
        None => {
            for by in enumeration.excluded.values() {
                cited.insert(first(by).to_string());
            }
            "domain-exhausted"
        }
    };
    Some(
        Diagnostic::new(
            ENUM_NO_VALUE_REMAINS,
            Severity::Impossible,
            vec![property.to_string()],
            "No {0} value satisfies {1}",
            vec![property.to_string(), join(&cited)],
        )
        .with_details(json!({
            "reason": reason,
            "domain": enumeration.domain,
            "excluded": enumeration.excluded.keys().collect::<Vec<_>>(),
            "conditions": cited,
        })),
    )
}

fn check_boolean(property: &str, boolean: &BooleanConstraint) -> Option<Diagnostic> {
    if !(boolean.requires_true() && boolean.requires_false()) {
        return None;
    }
    let (t, f) = (first(&boolean.required_true), first(&boolean.required_false));
    Some(
        Diagnostic::new(
            BOOLEAN_CONTRADICTION,
            Severity::Impossible,
            vec![property.to_string()],
            "{0} cannot be both true and false: {1} conflicts with {2}",
            vec![property.to_string(), t.to_string(), f.to_string()],
        )
        .with_details(json!({
            "reason": "both-values-required",
            "conditions": [t, f],
        })),
    )
}

// ──────────────────────────────────────────────
// Text
// ──────────────────────────────────────────────

/// One way a text restriction cannot be met.
struct TextConflict {
    reason: &'static str,
    explanation: String,
    cited: Cited,
}

impl TextConflict {
    fn new(reason: &'static str, explanation: String, cited: &[&Cited]) -> Self {
        TextConflict {
            reason,
            explanation,
            cited: cited.iter().map(|c| first(c).to_string()).collect(),
        }
    }
}

fn check_text(property: &str, text: &TextConstraint) -> Option<Diagnostic> {
    let mut conflicts = Vec::new();

    if let Some(allowed) = &text.allowed {
        if allowed.values.is_empty() {
            // Two different `equals` values are the most specific culprit.
            match pairs(&text.equals_values).first().copied() {
                Some((a, b, by_a, by_b)) => conflicts.push(TextConflict::new(
                    "allowed-sets-disjoint",
                    format!("a value cannot equal both \"{}\" and \"{}\"", a, b),
                    &[by_a, by_b],
                )),
                None => conflicts.push(TextConflict {
                    reason: "allowed-sets-disjoint",
                    explanation: "the required values have none in common".to_string(),
                    cited: allowed.cited.clone(),
                }),
            }
        } else {
            let failures: Vec<TextConflict> = allowed
                .values
                .iter()
                .filter_map(|candidate| candidate_failure(text, candidate))
                .collect();
            if failures.len() == allowed.values.len() {
                let mut cited = allowed.cited.clone();
                cited.extend(failures.iter().flat_map(|f| f.cited.iter().cloned()));
                conflicts.push(TextConflict {
                    reason: "no-allowed-value",
                    explanation: failures
                        .iter()
                        .map(|f| f.explanation.as_str())
                        .collect::<Vec<_>>()
                        .join("; "),
                    cited,
                });
            }
        }
    }

    pattern_conflicts(text, &mut conflicts);

    let head = conflicts.first()?;
    let cited: Cited = conflicts.iter().flat_map(|c| c.cited.iter().cloned()).collect();
    Some(
        Diagnostic::new(
            TEXT_UNSATISFIABLE,
            Severity::Impossible,
            vec![property.to_string()],
            "No {0} value satisfies {1}: {2}",
            vec![property.to_string(), join(&head.cited), head.explanation.clone()],
        )
        .with_details(json!({
            "reason": head.reason,
            "reasons": conflicts
                .iter()
                .map(|c| json!({"reason": c.reason, "explanation": c.explanation}))
                .collect::<Vec<_>>(),
            "conditions": cited,
        })),
    )
}

/// Why an allowed value fails the other text conditions, if it does.
fn candidate_failure(text: &TextConstraint, candidate: &str) -> Option<TextConflict> {
    let fail = |explanation: String, by: &Cited| {
        Some(TextConflict::new("no-allowed-value", explanation, &[by]))
    };
    if let Some(by) = text.excluded.get(candidate) {
        return fail(format!("\"{}\" is excluded", candidate), by);
    }
    for (prefix, by) in &text.prefixes {
        if !candidate.starts_with(prefix.as_str()) {
            return fail(format!("\"{}\" does not start with \"{}\"", candidate, prefix), by);
        }
    }
    for (suffix, by) in &text.suffixes {
        if !candidate.ends_with(suffix.as_str()) {
            return fail(format!("\"{}\" does not end with \"{}\"", candidate, suffix), by);
        }
    }
    for (needle, by) in &text.contains {
        if !candidate.contains(needle.as_str()) {
            return fail(format!("\"{}\" does not contain \"{}\"", candidate, needle), by);
        }
    }
    for (needle, by) in &text.not_contains {
        if candidate.contains(needle.as_str()) {
            return fail(format!("\"{}\" contains \"{}\"", candidate, needle), by);
        }
    }
    for (prefix, by) in &text.not_prefixes {
        if candidate.starts_with(prefix.as_str()) {
            return fail(format!("\"{}\" starts with \"{}\"", candidate, prefix), by);
        }
    }
    for (suffix, by) in &text.not_suffixes {
        if candidate.ends_with(suffix.as_str()) {
            return fail(format!("\"{}\" ends with \"{}\"", candidate, suffix), by);
        }
    }
    None
}

fn pattern_conflicts(text: &TextConstraint, out: &mut Vec<TextConflict>) {
    for (a, b, by_a, by_b) in pairs(&text.prefixes) {
        if !a.starts_with(b) && !b.starts_with(a) {
            out.push(TextConflict::new(
                "incompatible-prefixes",
                format!("a value cannot start with both \"{}\" and \"{}\"", a, b),
                &[by_a, by_b],
            ));
        }
    }
    for (a, b, by_a, by_b) in pairs(&text.suffixes) {
        if !a.ends_with(b) && !b.ends_with(a) {
            out.push(TextConflict::new(
                "incompatible-suffixes",
                format!("a value cannot end with both \"{}\" and \"{}\"", a, b),
                &[by_a, by_b],
            ));
        }
    }

    for (forbidden, by) in &text.not_contains {
        if forbidden.is_empty() {
            out.push(TextConflict::new(
                "forbidden-empty-substring",
                "every value contains the empty string".to_string(),
                &[by],
            ));
            continue;
        }
        let required = text
            .contains
            .iter()
            .chain(&text.prefixes)
            .chain(&text.suffixes);
        for (pattern, required_by) in required {
            if pattern.contains(forbidden.as_str()) {
                out.push(TextConflict::new(
                    "required-contains-forbidden",
                    format!("required \"{}\" contains forbidden \"{}\"", pattern, forbidden),
                    &[required_by, by],
                ));
            }
        }
    }

    for (excluded, by) in &text.not_prefixes {
        if excluded.is_empty() {
            out.push(TextConflict::new(
                "forbidden-empty-prefix",
                "every value starts with the empty string".to_string(),
                &[by],
            ));
            continue;
        }
        for (prefix, required_by) in &text.prefixes {
            if prefix.starts_with(excluded.as_str()) {
                out.push(TextConflict::new(
                    "required-prefix-excluded",
                    format!("required prefix \"{}\" starts with excluded \"{}\"", prefix, excluded),
                    &[required_by, by],
                ));
            }
        }
    }

    for (excluded, by) in &text.not_suffixes {
        if excluded.is_empty() {
            out.push(TextConflict::new(
                "forbidden-empty-suffix",
                "every value ends with the empty string".to_string(),
                &[by],
            ));
            continue;
        }
        for (suffix, required_by) in &text.suffixes {
            if suffix.ends_with(excluded.as_str()) {
                out.push(TextConflict::new(
                    "required-suffix-excluded",
                    format!("required suffix \"{}\" ends with excluded \"{}\"", suffix, excluded),
                    &[required_by, by],
                ));
            }
        }
    }
}

/// Unordered pairs of distinct patterns.
fn pairs(patterns: &Patterns) -> Vec<(&str, &str, &Cited, &Cited)> {
    let entries: Vec<(&String, &Cited)> = patterns.iter().collect();
    let mut out = Vec::new();
    for (i, (a, by_a)) in entries.iter().enumerate() {
        for (b, by_b) in &entries[i + 1..] {
            out.push((a.as_str(), b.as_str(), *by_a, *by_b));
        }
    }
    out
}

// ──────────────────────────────────────────────
// Vacuous conditions
// ──────────────────────────────────────────────

fn vacuous(constraint: &AggregatedConstraint) -> impl Iterator<Item = Diagnostic> + '_ {
    constraint.vacuous.iter().map(move |cited| {
        Diagnostic::new(
            CONDITION_VACUOUS,
            Severity::Info,
            vec![constraint.property.clone()],
            "{1} does not narrow {0}; every product already satisfies it",
            vec![constraint.property.clone(), cited.clone()],
        )
        .with_details(json!({
            "reason": "implied-by-catalog",
            "conditions": [cited],
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use filtercheck_core::{registry, Condition, Operator, Scalar};

    fn num(v: i64) -> Scalar {
        Scalar::Number(Decimal::from(v))
    }

    fn text(s: &str) -> Scalar {
        Scalar::Text(s.to_string())
    }

    fn run(conditions: &[Condition]) -> Vec<Diagnostic> {
        let config = CheckerConfig::default();
        check(&aggregate(conditions, registry::standard(), &config), &config)
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn satisfiable_range_is_clean() {
        let out = run(&[
            Condition::new("price", Operator::GreaterThan, num(10)),
            Condition::new("price", Operator::LessThan, num(50)),
        ]);
        assert!(out.is_empty(), "{:?}", out);
    }

    #[test]
    fn contradictory_bounds_cite_both_conditions() {
        let out = run(&[
            Condition::new("price", Operator::GreaterThan, num(100)),
            Condition::new("price", Operator::LessThan, num(50)),
        ]);
        assert_eq!(codes(&out), vec![NUMERIC_RANGE_EMPTY]);
        assert_eq!(out[0].message, "No price satisfies both price > 100 and price < 50");
        assert_eq!(out[0].details.as_ref().unwrap()["reason"], "inverted-bounds");
    }

    #[test]
    fn equals_outside_range() {
        let out = run(&[
            Condition::new("price", Operator::GreaterThan, num(100)),
            Condition::new("price", Operator::Equals, num(50)),
        ]);
        assert_eq!(codes(&out), vec![NUMERIC_RANGE_EMPTY]);
        assert!(out[0].message.contains("price = 50"));
    }

    #[test]
    fn negative_price_conflicts_with_catalog() {
        let out = run(&[Condition::new("price", Operator::LessThan, num(0))]);
        assert_eq!(codes(&out), vec![NUMERIC_RANGE_EMPTY]);
        assert!(out[0].message.contains("catalog bound"));
    }

    #[test]
    fn broad_range_warns() {
        let out = run(&[Condition::between(
            "price",
            Operator::Between,
            num(0),
            num(1_000_000),
        )]);
        assert_eq!(codes(&out), vec![NUMERIC_RANGE_BROAD]);
        assert_eq!(out[0].severity, Severity::Warning);
    }

    #[test]
    fn date_window_inverted() {
        let day = |s: &str| Scalar::Date(filtercheck_core::Moment::parse(s).unwrap());
        let out = run(&[
            Condition::new("date_created", Operator::GreaterThan, day("2024-06-01")),
            Condition::new("date_created", Operator::LessThanOrEqual, day("2024-06-01")),
        ]);
        assert_eq!(codes(&out), vec![DATE_RANGE_EMPTY]);
    }

    #[test]
    fn enum_exhaustion_by_exclusion() {
        let out = run(&[Condition::new(
            "stock_status",
            Operator::NotIn,
            Scalar::List(vec![text("instock"), text("outofstock"), text("onbackorder")]),
        )]);
        assert_eq!(codes(&out), vec![ENUM_NO_VALUE_REMAINS]);
        assert_eq!(out[0].details.as_ref().unwrap()["reason"], "domain-exhausted");
    }

    #[test]
    fn boolean_contradiction() {
        let out = run(&[
            Condition::new("on_sale", Operator::Equals, Scalar::Boolean(true)),
            Condition::new("on_sale", Operator::Equals, Scalar::Boolean(false)),
        ]);
        assert_eq!(codes(&out), vec![BOOLEAN_CONTRADICTION]);
    }

    #[test]
    fn text_equals_fails_prefix() {
        let out = run(&[
            Condition::new("sku", Operator::Equals, text("ABC-1")),
            Condition::new("sku", Operator::StartsWith, text("XYZ")),
        ]);
        assert_eq!(codes(&out), vec![TEXT_UNSATISFIABLE]);
        assert!(out[0].message.contains("does not start with \"xyz\""));
    }

    #[test]
    fn text_equals_is_case_insensitive() {
        let out = run(&[
            Condition::new("sku", Operator::Equals, text("ABC-1")),
            Condition::new("sku", Operator::StartsWith, text("abc")),
        ]);
        assert!(out.is_empty(), "{:?}", out);
    }

    #[test]
    fn different_equals_values_cite_only_the_equals() {
        let out = run(&[
            Condition::new("sku", Operator::Equals, text("A")),
            Condition::new("sku", Operator::Equals, text("B")),
            Condition::new(
                "sku",
                Operator::In,
                Scalar::List(vec![text("A"), text("B"), text("C")]),
            ),
        ]);
        assert_eq!(codes(&out), vec![TEXT_UNSATISFIABLE]);
        assert!(out[0].message.contains("cannot equal both \"a\" and \"b\""));
        let details = out[0].details.as_ref().unwrap();
        assert_eq!(details["reason"], "allowed-sets-disjoint");
        assert_eq!(details["conditions"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn incompatible_prefixes() {
        let out = run(&[
            Condition::new("sku", Operator::StartsWith, text("AB")),
            Condition::new("sku", Operator::StartsWith, text("XY")),
        ]);
        assert_eq!(codes(&out), vec![TEXT_UNSATISFIABLE]);
        assert_eq!(out[0].details.as_ref().unwrap()["reason"], "incompatible-prefixes");
    }

    #[test]
    fn required_substring_contains_forbidden() {
        let out = run(&[
            Condition::new("name", Operator::Contains, text("blue shirt")),
            Condition::new("name", Operator::NotContains, text("shirt")),
        ]);
        assert_eq!(codes(&out), vec![TEXT_UNSATISFIABLE]);
    }

    #[test]
    fn excluded_prefix_blocks_required_prefix() {
        let out = run(&[
            Condition::new("sku", Operator::StartsWith, text("TMP-1")),
            Condition::new("sku", Operator::StartsWith, text("TMP")).excluded(),
        ]);
        assert_eq!(codes(&out), vec![TEXT_UNSATISFIABLE]);
    }

    #[test]
    fn vacuous_condition_is_info() {
        let out = run(&[Condition::new("price", Operator::GreaterThanOrEqual, num(0))]);
        assert_eq!(codes(&out), vec![CONDITION_VACUOUS]);
        assert_eq!(out[0].severity, Severity::Info);
    }

    #[test]
    fn vacuous_reporting_can_be_disabled() {
        let config = CheckerConfig {
            report_vacuous: false,
            ..CheckerConfig::default()
        };
        let conditions = [Condition::new("price", Operator::GreaterThanOrEqual, num(0))];
        let out = check(&aggregate(&conditions, registry::standard(), &config), &config);
        assert!(out.is_empty());
    }
}
