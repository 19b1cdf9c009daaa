//! filtercheck-analyze -- consistency checking of product filter conditions.
//!
//! A filter is a list of conditions joined by AND. The checker folds the
//! conditions on each property into one restriction, decides whether each
//! restriction can still be met, and evaluates a table of cross-property
//! rules. Findings that make the filter match nothing are `Impossible`
//! and block the save; the rest are advisory.
//!
//! ```text
//! FilterDocument ─parse─▶ [Condition] ─aggregate─▶ satisfiability ┐
//!                                    └──────────▶ rules ──────────┴─merge─▶ CheckReport
//! ```

pub mod aggregate;
pub mod diagnostic;
pub mod report;
pub mod rules;
pub mod satisfiability;

pub use aggregate::{aggregate, AggregatedConstraint, Aggregation, Restriction};
pub use diagnostic::{interpolate, Diagnostic, Severity};
pub use report::{merge, CheckReport};

use filtercheck_core::{
    parse_document, registry, CheckerConfig, Combinator, Condition, ConfigError, FilterDocument,
    Registry,
};

/// Check a filter document given as JSON, with the standard registry and
/// default configuration.
pub fn check(document: &serde_json::Value) -> Result<CheckReport, ConfigError> {
    check_with(document, &CheckerConfig::default())
}

/// Check a filter document given as JSON, with the standard registry.
pub fn check_with(
    document: &serde_json::Value,
    config: &CheckerConfig,
) -> Result<CheckReport, ConfigError> {
    let document = FilterDocument::from_json(document)?;
    check_document(&document, registry::standard(), config)
}

/// Parse and check a document.
///
/// Configuration errors fail the call whatever the combinator. For `any`
/// documents the conditions are parsed but not analyzed: the report is
/// marked skipped and carries no diagnostics.
pub fn check_document(
    document: &FilterDocument,
    registry: &Registry,
    config: &CheckerConfig,
) -> Result<CheckReport, ConfigError> {
    config.validate(registry)?;
    let conditions = parse_document(document, registry, config)?;

    if document.combinator == Combinator::Any {
        tracing::warn!(
            conditions = conditions.len(),
            "filter combines conditions with OR; consistency analysis skipped"
        );
        return Ok(CheckReport::skipped(Combinator::Any, conditions.len()));
    }

    Ok(check_conditions(&conditions, registry, config))
}

/// Analyze already-parsed conditions as an AND filter.
pub fn check_conditions(
    conditions: &[Condition],
    registry: &Registry,
    config: &CheckerConfig,
) -> CheckReport {
    let aggregated = aggregate::aggregate(conditions, registry, config);
    let satisfiability = satisfiability::check(&aggregated, config);
    let rule_findings = rules::evaluate(conditions, registry);
    let diagnostics = report::merge(satisfiability, rule_findings);

    let report = CheckReport {
        combinator: Combinator::All,
        skipped: false,
        conditions_checked: conditions.len(),
        properties_checked: aggregated.len(),
        rules_evaluated: rules::rule_count(),
        diagnostics,
    };

    tracing::info!(
        conditions = report.conditions_checked,
        properties = report.properties_checked,
        impossible = report.count(Severity::Impossible),
        warnings = report.count(Severity::Warning),
        info = report.count(Severity::Info),
        "filter check complete"
    );

    report
}
