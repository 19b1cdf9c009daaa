//! Stock management, stock status and the product types that support them.

use super::{cite_pairs, Rule, RuleContext, RuleMatch};
use crate::diagnostic::Severity;
use rust_decimal::Decimal;

const UNSTOCKED_TYPES: &[&str] = &["external", "grouped"];

pub(super) const RULES: &[Rule] = &[
    Rule {
        code: "stock-backorders-without-management",
        severity: Severity::Impossible,
        properties: &["backorders", "manage_stock"],
        template: "Backorders are only allowed when stock is managed: {0} conflicts with {1}",
        matcher: backorders_without_management,
        supersedes: None,
    },
    Rule {
        code: "stock-quantity-without-management",
        severity: Severity::Warning,
        properties: &["manage_stock", "stock_quantity"],
        template: "Stock quantity is not tracked without stock management, so {1} has no effect alongside {0}",
        matcher: quantity_without_management,
        supersedes: None,
    },
    Rule {
        code: "stock-instock-without-quantity",
        severity: Severity::Impossible,
        properties: &["manage_stock", "stock_quantity", "stock_status"],
        template: "A managed product without stock is never in stock: {0} conflicts with {1} and {2}",
        matcher: instock_without_quantity,
        supersedes: None,
    },
    Rule {
        code: "stock-outofstock-with-quantity",
        severity: Severity::Warning,
        properties: &["manage_stock", "stock_quantity", "stock_status"],
        template: "A managed product with stock on hand is normally in stock: {0} together with {1} and {2}",
        matcher: outofstock_with_quantity,
        supersedes: None,
    },
    Rule {
        code: "type-external-managed-stock",
        severity: Severity::Impossible,
        properties: &["manage_stock", "product_type"],
        template: "External and grouped products do not manage stock: {0} conflicts with {1}",
        matcher: external_managed_stock,
        supersedes: None,
    },
    Rule {
        code: "type-virtual-unsupported",
        severity: Severity::Warning,
        properties: &["product_type", "virtual"],
        template: "Only simple and variable products can be virtual: {0} conflicts with {1}",
        matcher: virtual_unsupported,
        supersedes: None,
    },
];

fn backorders_without_management(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    cite_pairs(
        &ctx.confining("backorders", &["notify", "yes"]),
        &ctx.forcing("manage_stock", false),
    )
}

fn quantity_without_management(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    cite_pairs(
        &ctx.forcing("manage_stock", false),
        &ctx.mentions("stock_quantity"),
    )
}

/// Stock status, manage_stock and quantity, as one citation triple.
fn triples(status: &[String], managed: &[String], quantity: &[String]) -> Vec<RuleMatch> {
    let mut out = Vec::new();
    for s in status {
        for m in managed {
            for q in quantity {
                out.push(RuleMatch::citing(vec![s.clone(), m.clone(), q.clone()]));
            }
        }
    }
    out
}

fn instock_without_quantity(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    let empty: Vec<String> = ctx
        .upper_numbers("stock_quantity")
        .into_iter()
        .filter(|b| b.integral_ceiling() <= Decimal::ZERO)
        .map(|b| b.cited)
        .collect();
    triples(
        &ctx.confining("stock_status", &["instock"]),
        &ctx.forcing("manage_stock", true),
        &empty,
    )
}

fn outofstock_with_quantity(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    let stocked: Vec<String> = ctx
        .lower_numbers("stock_quantity")
        .into_iter()
        .filter(|b| b.integral_floor() >= Decimal::ONE)
        .map(|b| b.cited)
        .collect();
    triples(
        &ctx.confining("stock_status", &["outofstock"]),
        &ctx.forcing("manage_stock", true),
        &stocked,
    )
}

fn external_managed_stock(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    cite_pairs(
        &ctx.confining("product_type", UNSTOCKED_TYPES),
        &ctx.forcing("manage_stock", true),
    )
}

fn virtual_unsupported(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    cite_pairs(
        &ctx.confining("product_type", UNSTOCKED_TYPES),
        &ctx.forcing("virtual", true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use filtercheck_core::{registry, Condition, Operator, Scalar};

    fn text(s: &str) -> Scalar {
        Scalar::Text(s.to_string())
    }

    fn run(conditions: &[Condition], matcher: fn(&RuleContext<'_>) -> Vec<RuleMatch>) -> usize {
        matcher(&RuleContext::new(conditions, registry::standard())).len()
    }

    #[test]
    fn backorders_need_management() {
        let conditions = [
            Condition::new("backorders", Operator::Equals, text("yes")),
            Condition::new("manage_stock", Operator::Equals, Scalar::Boolean(false)),
        ];
        assert_eq!(run(&conditions, backorders_without_management), 1);
    }

    #[test]
    fn backorders_no_without_management_is_fine() {
        let conditions = [
            Condition::new("backorders", Operator::Equals, text("no")),
            Condition::new("manage_stock", Operator::Equals, Scalar::Boolean(false)),
        ];
        assert_eq!(run(&conditions, backorders_without_management), 0);
    }

    #[test]
    fn in_stock_with_nothing_on_hand() {
        let conditions = [
            Condition::new("stock_status", Operator::Equals, text("instock")),
            Condition::new("manage_stock", Operator::Equals, Scalar::Boolean(true)),
            Condition::new("stock_quantity", Operator::LessThan, Scalar::Number(Decimal::ONE)),
        ];
        assert_eq!(run(&conditions, instock_without_quantity), 1);
        assert_eq!(run(&conditions[..2], instock_without_quantity), 0);
    }

    #[test]
    fn out_of_stock_with_quantity_on_hand() {
        let conditions = [
            Condition::new("stock_status", Operator::Equals, text("outofstock")),
            Condition::new("manage_stock", Operator::Equals, Scalar::Boolean(true)),
            Condition::new("stock_quantity", Operator::GreaterThan, Scalar::Number(Decimal::ZERO)),
        ];
        assert_eq!(run(&conditions, outofstock_with_quantity), 1);
    }

    #[test]
    fn external_products_with_managed_stock() {
        let conditions = [
            Condition::new(
                "product_type",
                Operator::In,
                Scalar::List(vec![text("external"), text("grouped")]),
            ),
            Condition::new("manage_stock", Operator::Equals, Scalar::Boolean(true)),
        ];
        assert_eq!(run(&conditions, external_managed_stock), 1);
        let mixed = [
            Condition::new(
                "product_type",
                Operator::In,
                Scalar::List(vec![text("external"), text("simple")]),
            ),
            Condition::new("manage_stock", Operator::Equals, Scalar::Boolean(true)),
        ];
        assert_eq!(run(&mixed, external_managed_stock), 0);
    }
}
