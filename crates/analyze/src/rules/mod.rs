//! Cross-property rules.
//!
//! Each rule knows an invariant of the product data model that links two
//! or more properties (a sale ends after it starts, virtual products have
//! no weight, ...). Rules look at individual conditions rather than the
//! aggregate, so a rule fires once per matching combination of conditions
//! and every finding cites exactly the conditions involved.
//!
//! The table is fixed and ordered. Every rule is evaluated on every call.

mod catalog;
mod inventory;
mod physical;
mod pricing;
mod temporal;

use filtercheck_core::{Condition, Operator, Registry};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeSet;
use time::PrimitiveDateTime;

use crate::aggregate::{step_down, step_up};
use crate::diagnostic::{Diagnostic, Severity};

/// A registered cross-property rule.
pub struct Rule {
    /// Stable identifier, `<family>-<name>`.
    pub code: &'static str,
    pub severity: Severity,
    /// Properties the rule relates, sorted.
    pub properties: &'static [&'static str],
    pub template: &'static str,
    pub matcher: fn(&RuleContext<'_>) -> Vec<RuleMatch>,
    /// Generic satisfiability code this rule restates more specifically.
    pub supersedes: Option<&'static str>,
}

/// One firing of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub args: Vec<String>,
    pub cited: Vec<String>,
}

impl RuleMatch {
    /// A match whose template arguments are exactly the cited conditions.
    pub fn citing(cited: Vec<String>) -> Self {
        RuleMatch {
            args: cited.clone(),
            cited,
        }
    }
}

/// Every rule, in evaluation order.
pub fn table() -> impl Iterator<Item = &'static Rule> {
    temporal::RULES
        .iter()
        .chain(pricing::RULES)
        .chain(physical::RULES)
        .chain(inventory::RULES)
        .chain(catalog::RULES)
}

pub fn rule_count() -> usize {
    table().count()
}

/// Evaluate every rule against the conditions.
pub fn evaluate(conditions: &[Condition], registry: &Registry) -> Vec<Diagnostic> {
    let ctx = RuleContext::new(conditions, registry);
    let mut out = Vec::new();
    for rule in table() {
        for found in (rule.matcher)(&ctx) {
            tracing::debug!(code = rule.code, conditions = ?found.cited, "rule fired");
            out.push(
                Diagnostic::new(
                    rule.code,
                    rule.severity,
                    rule.properties.iter().map(|p| p.to_string()).collect(),
                    rule.template,
                    found.args,
                )
                .with_details(json!({ "conditions": found.cited }))
                .superseding(rule.supersedes),
            );
        }
    }
    out
}

// ──────────────────────────────────────────────
// Matcher helpers
// ──────────────────────────────────────────────

/// A one-sided bound implied by a single condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound<T> {
    pub value: T,
    pub strict: bool,
    pub cited: String,
}

impl Bound<Decimal> {
    /// Some value above zero is required.
    pub fn positive(&self) -> bool {
        self.value > Decimal::ZERO || (self.value.is_zero() && self.strict)
    }

    /// Smallest integer the bound admits, as a lower bound.
    pub fn integral_floor(&self) -> Decimal {
        if self.strict {
            step_up(self.value.floor(), Decimal::ONE)
        } else {
            self.value.ceil()
        }
    }

    /// Largest integer the bound admits, as an upper bound.
    pub fn integral_ceiling(&self) -> Decimal {
        if self.strict {
            step_down(self.value.ceil(), Decimal::ONE)
        } else {
            self.value.floor()
        }
    }
}

/// Whether `later >= earlier` is impossible given an upper bound on
/// `later` and a lower bound on `earlier`.
pub fn order_violated<T: Ord>(upper_of_later: &Bound<T>, lower_of_earlier: &Bound<T>) -> bool {
    upper_of_later.value < lower_of_earlier.value
        || (upper_of_later.value == lower_of_earlier.value
            && (upper_of_later.strict || lower_of_earlier.strict))
}

/// Conditions grouped for rule matching.
pub struct RuleContext<'a> {
    conditions: &'a [Condition],
    registry: &'a Registry,
}

impl<'a> RuleContext<'a> {
    pub fn new(conditions: &'a [Condition], registry: &'a Registry) -> Self {
        RuleContext {
            conditions,
            registry,
        }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    fn on(&self, property: &'a str) -> impl Iterator<Item = &'a Condition> + 'a {
        self.conditions.iter().filter(move |c| c.property == property)
    }

    /// Every condition on the property, rendered.
    pub fn mentions(&self, property: &'a str) -> Vec<String> {
        self.on(property).map(|c| c.to_string()).collect()
    }

    pub fn lower_numbers(&self, property: &'a str) -> Vec<Bound<Decimal>> {
        self.on(property)
            .filter_map(|c| {
                let (value, strict) = match c.normalized().operator {
                    Operator::GreaterThan => (c.value.as_number()?, true),
                    Operator::GreaterThanOrEqual | Operator::Equals => {
                        (c.value.as_number()?, false)
                    }
                    Operator::Between => (c.range_values()?.0.as_number()?, false),
                    Operator::In => (numbers(c).min()?, false),
                    _ => return None,
                };
                Some(Bound {
                    value,
                    strict,
                    cited: c.to_string(),
                })
            })
            .collect()
    }

    pub fn upper_numbers(&self, property: &'a str) -> Vec<Bound<Decimal>> {
        self.on(property)
            .filter_map(|c| {
                let (value, strict) = match c.normalized().operator {
                    Operator::LessThan => (c.value.as_number()?, true),
                    Operator::LessThanOrEqual | Operator::Equals => (c.value.as_number()?, false),
                    Operator::Between => (c.range_values()?.1.as_number()?, false),
                    Operator::In => (numbers(c).max()?, false),
                    _ => return None,
                };
                Some(Bound {
                    value,
                    strict,
                    cited: c.to_string(),
                })
            })
            .collect()
    }

    /// Earliest instant each condition admits. A date-only `> d` starts
    /// after the whole day.
    pub fn lower_dates(&self, property: &'a str) -> Vec<Bound<PrimitiveDateTime>> {
        self.on(property)
            .filter_map(|c| {
                let (value, strict) = match c.normalized().operator {
                    Operator::GreaterThan => (c.value.as_date()?.end, true),
                    Operator::GreaterThanOrEqual | Operator::Equals => {
                        (c.value.as_date()?.start, false)
                    }
                    Operator::Between => (c.range_values()?.0.as_date()?.start, false),
                    _ => return None,
                };
                Some(Bound {
                    value,
                    strict,
                    cited: c.to_string(),
                })
            })
            .collect()
    }

    /// Latest instant each condition admits.
    pub fn upper_dates(&self, property: &'a str) -> Vec<Bound<PrimitiveDateTime>> {
        self.on(property)
            .filter_map(|c| {
                let (value, strict) = match c.normalized().operator {
                    Operator::LessThan => (c.value.as_date()?.start, true),
                    Operator::LessThanOrEqual | Operator::Equals => (c.value.as_date()?.end, false),
                    Operator::Between => (c.range_values()?.1.as_date()?.end, false),
                    _ => return None,
                };
                Some(Bound {
                    value,
                    strict,
                    cited: c.to_string(),
                })
            })
            .collect()
    }

    /// Conditions forcing a boolean property to `value`.
    pub fn forcing(&self, property: &'a str, value: bool) -> Vec<String> {
        self.on(property)
            .filter(|c| {
                let Some(b) = c.value.as_bool() else {
                    return false;
                };
                match c.normalized().operator {
                    Operator::Equals => b == value,
                    Operator::NotEquals => b != value,
                    _ => false,
                }
            })
            .map(|c| c.to_string())
            .collect()
    }

    /// The enum values each condition leaves possible.
    pub fn enum_subsets(&self, property: &'a str) -> Vec<(BTreeSet<String>, String)> {
        let domain: BTreeSet<String> = self
            .registry
            .get(property)
            .and_then(|d| d.enum_values())
            .map(|values| values.iter().cloned().collect())
            .unwrap_or_default();
        self.on(property)
            .filter_map(|c| {
                let named: BTreeSet<String> = c
                    .value
                    .elements()
                    .iter()
                    .filter_map(|v| v.as_text())
                    .map(str::to_string)
                    .collect();
                let subset = match c.normalized().operator {
                    Operator::Equals | Operator::In => named,
                    Operator::NotEquals | Operator::NotIn => {
                        domain.difference(&named).cloned().collect()
                    }
                    _ => return None,
                };
                Some((subset, c.to_string()))
            })
            .collect()
    }

    /// Conditions confining an enum property to a non-empty subset of
    /// `values`.
    pub fn confining(&self, property: &'a str, values: &[&str]) -> Vec<String> {
        self.enum_subsets(property)
            .into_iter()
            .filter(|(subset, _)| {
                !subset.is_empty() && subset.iter().all(|v| values.contains(&v.as_str()))
            })
            .map(|(_, cited)| cited)
            .collect()
    }

    /// Conditions requiring a non-empty text value or fragment.
    pub fn requiring_text(&self, property: &'a str) -> Vec<String> {
        self.on(property)
            .filter(|c| {
                let n = c.normalized();
                let positive = matches!(
                    n.operator,
                    Operator::Equals
                        | Operator::In
                        | Operator::Contains
                        | Operator::StartsWith
                        | Operator::EndsWith
                ) && !n.negated;
                positive
                    && c
                        .value
                        .elements()
                        .iter()
                        .filter_map(|v| v.as_text())
                        .any(|s| !s.is_empty())
            })
            .map(|c| c.to_string())
            .collect()
    }
}

fn numbers(condition: &Condition) -> impl Iterator<Item = Decimal> + '_ {
    condition.value.elements().iter().filter_map(|v| v.as_number())
}

/// Every `(a, b)` pair for which `f` produces a match.
pub fn cross<A, B>(a: &[A], b: &[B], f: impl Fn(&A, &B) -> Option<RuleMatch>) -> Vec<RuleMatch> {
    a.iter()
        .flat_map(|x| b.iter().filter_map(|y| f(x, y)).collect::<Vec<_>>())
        .collect()
}

/// Pairs of cited conditions, one from each list.
pub fn cite_pairs(a: &[String], b: &[String]) -> Vec<RuleMatch> {
    cross(a, b, |x, y| Some(RuleMatch::citing(vec![x.clone(), y.clone()])))
}
