//! Relations between the active, regular and sale prices.

use super::{cross, Bound, Rule, RuleContext, RuleMatch};
use crate::diagnostic::Severity;
use rust_decimal::Decimal;

pub(super) const RULES: &[Rule] = &[
    Rule {
        code: "pricing-sale-not-below-regular",
        severity: Severity::Impossible,
        properties: &["regular_price", "sale_price"],
        template: "A sale price must be below the regular price: {0} conflicts with {1}",
        matcher: sale_not_below_regular,
        supersedes: None,
    },
    Rule {
        code: "pricing-price-above-regular",
        severity: Severity::Impossible,
        properties: &["price", "regular_price"],
        template: "The active price never exceeds the regular price: {0} conflicts with {1}",
        matcher: price_above_regular,
        supersedes: None,
    },
    Rule {
        code: "pricing-on-sale-without-sale-price",
        severity: Severity::Impossible,
        properties: &["on_sale", "sale_price"],
        template: "A product on sale has a positive sale price: {0} conflicts with {1}",
        matcher: on_sale_without_sale_price,
        supersedes: None,
    },
    Rule {
        code: "pricing-not-on-sale-price-differs",
        severity: Severity::Impossible,
        properties: &["on_sale", "price", "regular_price"],
        template: "A product not on sale is sold at its regular price: {0} conflicts with {1} and {2}",
        matcher: not_on_sale_price_differs,
        supersedes: None,
    },
    Rule {
        code: "type-grouped-has-price",
        severity: Severity::Warning,
        properties: &["price", "product_type"],
        template: "Grouped products take their prices from their children, so {1} has no effect alongside {0}",
        matcher: grouped_has_price,
        supersedes: None,
    },
];

/// Whether `low <= high` is impossible.
fn not_at_most(lower_of_low: &Bound<Decimal>, upper_of_high: &Bound<Decimal>) -> bool {
    super::order_violated(upper_of_high, lower_of_low)
}

fn sale_not_below_regular(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    let sale = ctx.lower_numbers("sale_price");
    let regular = ctx.upper_numbers("regular_price");
    // sale < regular is strict, so meeting at the same value is already a conflict.
    cross(&sale, &regular, |s, r| {
        (s.value >= r.value).then(|| RuleMatch::citing(vec![s.cited.clone(), r.cited.clone()]))
    })
}

fn price_above_regular(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    let price = ctx.lower_numbers("price");
    let regular = ctx.upper_numbers("regular_price");
    cross(&price, &regular, |p, r| {
        not_at_most(p, r).then(|| RuleMatch::citing(vec![p.cited.clone(), r.cited.clone()]))
    })
}

fn on_sale_without_sale_price(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    let on_sale = ctx.forcing("on_sale", true);
    let pinned: Vec<String> = ctx
        .upper_numbers("sale_price")
        .into_iter()
        .filter(|b| b.value <= Decimal::ZERO)
        .map(|b| b.cited)
        .collect();
    super::cite_pairs(&on_sale, &pinned)
}

fn not_on_sale_price_differs(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    let off_sale = ctx.forcing("on_sale", false);
    if off_sale.is_empty() {
        return Vec::new();
    }
    let mut pairs = Vec::new();
    // price below every admissible regular price
    for (p, r) in bounds_pairs(&ctx.upper_numbers("price"), &ctx.lower_numbers("regular_price")) {
        if super::order_violated(p, r) {
            pairs.push((p.cited.clone(), r.cited.clone()));
        }
    }
    // price above every admissible regular price
    for (p, r) in bounds_pairs(&ctx.lower_numbers("price"), &ctx.upper_numbers("regular_price")) {
        if not_at_most(p, r) {
            pairs.push((p.cited.clone(), r.cited.clone()));
        }
    }
    off_sale
        .iter()
        .flat_map(|o| {
            pairs
                .iter()
                .map(|(p, r)| RuleMatch::citing(vec![o.clone(), p.clone(), r.clone()]))
        })
        .collect()
}

fn bounds_pairs<'b>(
    a: &'b [Bound<Decimal>],
    b: &'b [Bound<Decimal>],
) -> impl Iterator<Item = (&'b Bound<Decimal>, &'b Bound<Decimal>)> {
    a.iter().flat_map(move |x| b.iter().map(move |y| (x, y)))
}

fn grouped_has_price(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    let grouped = ctx.confining("product_type", &["grouped"]);
    let priced: Vec<String> = ctx
        .lower_numbers("price")
        .into_iter()
        .filter(Bound::positive)
        .map(|b| b.cited)
        .collect();
    super::cite_pairs(&grouped, &priced)
}
