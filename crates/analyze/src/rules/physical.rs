//! Shipping attributes of virtual and downloadable products.

use super::{cite_pairs, Bound, Rule, RuleContext, RuleMatch};
use crate::diagnostic::Severity;

const DIMENSIONS: [&str; 4] = ["weight", "length", "width", "height"];

pub(super) const RULES: &[Rule] = &[
    Rule {
        code: "physical-virtual-has-dimensions",
        severity: Severity::Impossible,
        properties: &["height", "length", "virtual", "weight", "width"],
        template: "Virtual products have no {0}: {1} conflicts with {2}",
        matcher: virtual_has_dimensions,
        supersedes: None,
    },
    Rule {
        code: "physical-downloadable-has-weight",
        severity: Severity::Warning,
        properties: &["downloadable", "weight"],
        template: "Downloadable products rarely carry a weight: {0} together with {1}",
        matcher: downloadable_has_weight,
        supersedes: None,
    },
    Rule {
        code: "physical-virtual-shipping-class",
        severity: Severity::Warning,
        properties: &["shipping_class", "virtual"],
        template: "Virtual products are never shipped, so {1} has no effect alongside {0}",
        matcher: virtual_shipping_class,
        supersedes: None,
    },
];

fn positive(ctx: &RuleContext<'_>, property: &'static str) -> Vec<String> {
    ctx.lower_numbers(property)
        .into_iter()
        .filter(Bound::positive)
        .map(|b| b.cited)
        .collect()
}

fn virtual_has_dimensions(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    let flagged = ctx.forcing("virtual", true);
    let mut out = Vec::new();
    for dimension in DIMENSIONS {
        for pair in cite_pairs(&flagged, &positive(ctx, dimension)) {
            let mut args = vec![dimension.to_string()];
            args.extend(pair.cited.iter().cloned());
            out.push(RuleMatch {
                args,
                cited: pair.cited,
            });
        }
    }
    out
}

fn downloadable_has_weight(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    cite_pairs(&ctx.forcing("downloadable", true), &positive(ctx, "weight"))
}

fn virtual_shipping_class(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    cite_pairs(
        &ctx.forcing("virtual", true),
        &ctx.requiring_text("shipping_class"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use filtercheck_core::{registry, Condition, Operator, Scalar};
    use rust_decimal::Decimal;

    #[test]
    fn virtual_product_with_weight() {
        let conditions = [
            Condition::new("virtual", Operator::Equals, Scalar::Boolean(true)),
            Condition::new("weight", Operator::GreaterThan, Scalar::Number(Decimal::ZERO)),
            Condition::new("height", Operator::LessThan, Scalar::Number(Decimal::TEN)),
        ];
        let found = virtual_has_dimensions(&RuleContext::new(&conditions, registry::standard()));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].args[0], "weight");
        assert_eq!(found[0].cited, vec!["virtual = true", "weight > 0"]);
    }

    #[test]
    fn excluded_shipping_class_is_not_a_requirement() {
        let conditions = [
            Condition::new("virtual", Operator::Equals, Scalar::Boolean(true)),
            Condition::new("shipping_class", Operator::Equals, Scalar::Text("bulky".into()))
                .excluded(),
        ];
        let ctx = RuleContext::new(&conditions, registry::standard());
        assert!(virtual_shipping_class(&ctx).is_empty());
    }
}
