//! Ordering of the product's lifecycle and sale dates.

use super::{order_violated, Bound, Rule, RuleContext, RuleMatch};
use crate::diagnostic::Severity;
use time::PrimitiveDateTime;

pub(super) const RULES: &[Rule] = &[
    Rule {
        code: "temporal-modified-before-created",
        severity: Severity::Impossible,
        properties: &["date_created", "date_modified"],
        template: "A product cannot be modified before it is created: {0} conflicts with {1}",
        matcher: modified_before_created,
        supersedes: None,
    },
    Rule {
        code: "temporal-sale-end-before-start",
        severity: Severity::Impossible,
        properties: &["date_on_sale_from", "date_on_sale_to"],
        template: "A sale cannot end before it starts: {0} conflicts with {1}",
        matcher: sale_end_before_start,
        supersedes: None,
    },
    Rule {
        code: "temporal-sale-ends-before-creation",
        severity: Severity::Warning,
        properties: &["date_created", "date_on_sale_to"],
        template: "The sale would be over before the product existed: {0} conflicts with {1}",
        matcher: sale_ends_before_creation,
        supersedes: None,
    },
];

/// `later` must not precede `earlier`.
fn ordered(ctx: &RuleContext<'_>, later: &'static str, earlier: &'static str) -> Vec<RuleMatch> {
    let upper: Vec<Bound<PrimitiveDateTime>> = ctx.upper_dates(later);
    let lower = ctx.lower_dates(earlier);
    super::cross(&upper, &lower, |u, l| {
        order_violated(u, l).then(|| RuleMatch::citing(vec![u.cited.clone(), l.cited.clone()]))
    })
}

fn modified_before_created(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    ordered(ctx, "date_modified", "date_created")
}

fn sale_end_before_start(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    ordered(ctx, "date_on_sale_to", "date_on_sale_from")
}

fn sale_ends_before_creation(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    ordered(ctx, "date_on_sale_to", "date_created")
}

#[cfg(test)]
mod tests {
    use super::*;
    use filtercheck_core::{registry, Condition, Moment, Operator, Scalar};

    fn day(s: &str) -> Scalar {
        Scalar::Date(Moment::parse(s).unwrap())
    }

    fn matches(conditions: &[Condition], matcher: fn(&RuleContext<'_>) -> Vec<RuleMatch>) -> usize {
        matcher(&RuleContext::new(conditions, registry::standard())).len()
    }

    #[test]
    fn modified_window_before_created_window() {
        let conditions = [
            Condition::new("date_modified", Operator::LessThan, day("2024-01-01")),
            Condition::new("date_created", Operator::GreaterThan, day("2024-02-01")),
        ];
        assert_eq!(matches(&conditions, modified_before_created), 1);
    }

    #[test]
    fn same_day_is_allowed() {
        let conditions = [
            Condition::new("date_modified", Operator::Equals, day("2024-01-01")),
            Condition::new("date_created", Operator::Equals, day("2024-01-01")),
        ];
        assert_eq!(matches(&conditions, modified_before_created), 0);
    }

    #[test]
    fn strict_bounds_on_the_same_day() {
        let conditions = [
            Condition::new("date_on_sale_to", Operator::LessThan, day("2024-05-01")),
            Condition::new("date_on_sale_from", Operator::GreaterThanOrEqual, day("2024-05-01")),
        ];
        assert_eq!(matches(&conditions, sale_end_before_start), 1);
    }

    #[test]
    fn sale_ending_before_creation() {
        let conditions = [
            Condition::new("date_on_sale_to", Operator::LessThanOrEqual, day("2023-12-31")),
            Condition::between(
                "date_created",
                Operator::Between,
                day("2024-01-01"),
                day("2024-06-30"),
            ),
        ];
        assert_eq!(matches(&conditions, sale_ends_before_creation), 1);
    }
}
