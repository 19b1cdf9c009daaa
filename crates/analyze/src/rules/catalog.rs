//! Reviews, tax, and enumerations a filter rules out completely.

use super::{cite_pairs, Bound, Rule, RuleContext, RuleMatch};
use crate::aggregate::join;
use crate::diagnostic::Severity;
use crate::satisfiability::ENUM_NO_VALUE_REMAINS;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

pub(super) const RULES: &[Rule] = &[
    Rule {
        code: "reviews-rating-without-reviews",
        severity: Severity::Impossible,
        properties: &["average_rating", "review_count"],
        template: "A product without reviews has no rating: {0} conflicts with {1}",
        matcher: rating_without_reviews,
        supersedes: None,
    },
    Rule {
        code: "reviews-disabled-with-rating",
        severity: Severity::Warning,
        properties: &["average_rating", "review_count", "reviews_allowed"],
        template: "Reviews are turned off by {0}, yet {1} expects existing reviews",
        matcher: disabled_with_rating,
        supersedes: None,
    },
    Rule {
        code: "tax-none-with-tax-class",
        severity: Severity::Warning,
        properties: &["tax_class", "tax_status"],
        template: "The tax class of an untaxed product is ignored, so {1} has no effect alongside {0}",
        matcher: none_with_tax_class,
        supersedes: None,
    },
    Rule {
        code: "catalog-product-type-exhausted",
        severity: Severity::Impossible,
        properties: &["product_type"],
        template: "No {0} remains after {1}",
        matcher: product_type_exhausted,
        supersedes: Some(ENUM_NO_VALUE_REMAINS),
    },
    Rule {
        code: "catalog-stock-status-exhausted",
        severity: Severity::Impossible,
        properties: &["stock_status"],
        template: "No {0} remains after {1}",
        matcher: stock_status_exhausted,
        supersedes: Some(ENUM_NO_VALUE_REMAINS),
    },
    Rule {
        code: "catalog-tax-status-exhausted",
        severity: Severity::Impossible,
        properties: &["tax_status"],
        template: "No {0} remains after {1}",
        matcher: tax_status_exhausted,
        supersedes: Some(ENUM_NO_VALUE_REMAINS),
    },
];

fn rated(ctx: &RuleContext<'_>) -> Vec<String> {
    ctx.lower_numbers("average_rating")
        .into_iter()
        .filter(Bound::positive)
        .map(|b| b.cited)
        .collect()
}

fn rating_without_reviews(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    let unreviewed: Vec<String> = ctx
        .upper_numbers("review_count")
        .into_iter()
        .filter(|b| b.integral_ceiling() <= Decimal::ZERO)
        .map(|b| b.cited)
        .collect();
    cite_pairs(&rated(ctx), &unreviewed)
}

fn disabled_with_rating(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    let mut expecting = rated(ctx);
    expecting.extend(
        ctx.lower_numbers("review_count")
            .into_iter()
            .filter(|b| b.integral_floor() >= Decimal::ONE)
            .map(|b| b.cited),
    );
    cite_pairs(&ctx.forcing("reviews_allowed", false), &expecting)
}

fn none_with_tax_class(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    let classes = ctx
        .registry()
        .get("tax_class")
        .and_then(|d| d.enum_values())
        .map_or(0, <[String]>::len);
    let narrowing: Vec<String> = ctx
        .enum_subsets("tax_class")
        .into_iter()
        .filter(|(subset, _)| subset.len() < classes)
        .map(|(_, cited)| cited)
        .collect();
    cite_pairs(&ctx.confining("tax_status", &["none"]), &narrowing)
}

/// Fires once when the conditions on an enum property leave no value.
fn exhausted(ctx: &RuleContext<'_>, property: &'static str) -> Vec<RuleMatch> {
    let Some(domain) = ctx.registry().get(property) else {
        return Vec::new();
    };
    let subsets = ctx.enum_subsets(property);
    if subsets.is_empty() {
        return Vec::new();
    }
    let mut remaining: BTreeSet<String> = domain
        .enum_values()
        .map(|values| values.iter().cloned().collect())
        .unwrap_or_default();
    let mut cited = BTreeSet::new();
    for (subset, by) in subsets {
        remaining = remaining.intersection(&subset).cloned().collect();
        cited.insert(by);
    }
    if !remaining.is_empty() {
        return Vec::new();
    }
    vec![RuleMatch {
        args: vec![domain.label.to_lowercase(), join(&cited)],
        cited: cited.into_iter().collect(),
    }]
}

fn product_type_exhausted(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    exhausted(ctx, "product_type")
}

fn stock_status_exhausted(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    exhausted(ctx, "stock_status")
}

fn tax_status_exhausted(ctx: &RuleContext<'_>) -> Vec<RuleMatch> {
    exhausted(ctx, "tax_status")
}
