//! Constraint aggregation -- folds every condition on a property into one
//! effective restriction.
//!
//! Folding only ever narrows: bounds tighten, allowed sets intersect,
//! excluded sets and pattern sets grow. Every operation is commutative
//! and idempotent, and ties between equal bounds are broken by the
//! rendered condition text, so any permutation of the input (duplicates
//! included) produces an equal aggregate.

use filtercheck_core::{
    CheckerConfig, Condition, Operator, PropertyDomain, PropertyKind, Registry, Scalar,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use time::{Duration, PrimitiveDateTime};

/// Rendered conditions responsible for part of a restriction.
pub type Cited = BTreeSet<String>;

/// Pattern (or value) → conditions that imposed it.
pub type Patterns = BTreeMap<String, Cited>;

/// Open numeric bounds move by this much; `> 20` becomes `>= 20.000001`.
pub fn epsilon() -> Decimal {
    Decimal::new(1, 6)
}

/// `v + step`, saturating at [`Decimal::MAX`].
pub fn step_up(v: Decimal, step: Decimal) -> Decimal {
    v.checked_add(step).unwrap_or(Decimal::MAX)
}

/// `v - step`, saturating at [`Decimal::MIN`].
pub fn step_down(v: Decimal, step: Decimal) -> Decimal {
    v.checked_sub(step).unwrap_or(Decimal::MIN)
}

// ──────────────────────────────────────────────
// Intervals
// ──────────────────────────────────────────────

/// One side of an interval and the condition that set it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit<T> {
    pub value: T,
    pub cited: String,
    pub from_catalog: bool,
}

/// A closed excluded span.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span<T> {
    pub start: T,
    pub end: T,
    pub cited: String,
}

/// An explicit set of allowed points (`in` on a numeric property).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Points<T: Ord> {
    pub values: BTreeSet<T>,
    pub cited: Cited,
}

/// Why an interval admits no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emptiness<T: Ord> {
    /// `min > max`.
    Inverted { min: Limit<T>, max: Limit<T> },
    /// Every allowed point lies outside the range or inside an excluded span.
    NoAllowedPoint { points: Points<T> },
    /// Excluded spans cover `[min, max]` without a gap.
    Covered {
        min: Limit<T>,
        max: Limit<T>,
        spans: Vec<Span<T>>,
    },
}

/// Inclusive interval with excluded spans and optional allowed points.
/// Missing limits are unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval<T: Ord> {
    pub min: Option<Limit<T>>,
    pub max: Option<Limit<T>>,
    pub excluded: BTreeSet<Span<T>>,
    pub allowed: Option<Points<T>>,
}

impl<T: Ord> Default for Interval<T> {
    fn default() -> Self {
        Interval {
            min: None,
            max: None,
            excluded: BTreeSet::new(),
            allowed: None,
        }
    }
}

impl<T: Ord + Clone> Interval<T> {
    pub fn raise_min(&mut self, value: T, cited: String, from_catalog: bool) {
        let replace = match &self.min {
            None => true,
            Some(cur) => value > cur.value || (value == cur.value && cited < cur.cited),
        };
        if replace {
            self.min = Some(Limit {
                value,
                cited,
                from_catalog,
            });
        }
    }

    pub fn lower_max(&mut self, value: T, cited: String, from_catalog: bool) {
        let replace = match &self.max {
            None => true,
            Some(cur) => value < cur.value || (value == cur.value && cited < cur.cited),
        };
        if replace {
            self.max = Some(Limit {
                value,
                cited,
                from_catalog,
            });
        }
    }

    pub fn exclude(&mut self, start: T, end: T, cited: String) {
        if start <= end {
            self.excluded.insert(Span { start, end, cited });
        }
    }

    pub fn allow(&mut self, values: BTreeSet<T>, cited: String) {
        match &mut self.allowed {
            None => {
                self.allowed = Some(Points {
                    values,
                    cited: BTreeSet::from([cited]),
                });
            }
            Some(points) => {
                points.values = points.values.intersection(&values).cloned().collect();
                points.cited.insert(cited);
            }
        }
    }

    /// Whether `value` lies within the limits and outside every span.
    pub fn admits(&self, value: &T) -> bool {
        self.min.as_ref().is_none_or(|m| *value >= m.value)
            && self.max.as_ref().is_none_or(|m| *value <= m.value)
            && !self
                .excluded
                .iter()
                .any(|s| *value >= s.start && *value <= s.end)
    }

    /// Both limits, when the range is bounded on each side.
    pub fn bounds(&self) -> Option<(&Limit<T>, &Limit<T>)> {
        Some((self.min.as_ref()?, self.max.as_ref()?))
    }

    /// Find a reason the interval is empty. `succ` returns the smallest
    /// representable value above its argument.
    pub fn emptiness(&self, succ: impl Fn(&T) -> T) -> Option<Emptiness<T>> {
        if let Some((min, max)) = self.bounds() {
            if min.value > max.value {
                return Some(Emptiness::Inverted {
                    min: min.clone(),
                    max: max.clone(),
                });
            }
        }

        if let Some(points) = &self.allowed {
            if !points.values.iter().any(|v| self.admits(v)) {
                return Some(Emptiness::NoAllowedPoint {
                    points: points.clone(),
                });
            }
            return None;
        }

        let (min, max) = self.bounds()?;
        let mut cursor = min.value.clone();
        let mut used = Vec::new();
        for span in &self.excluded {
            if span.end < cursor {
                continue;
            }
            if span.start > cursor {
                break;
            }
            used.push(span.clone());
            if span.end >= max.value {
                return Some(Emptiness::Covered {
                    min: min.clone(),
                    max: max.clone(),
                    spans: used,
                });
            }
            cursor = succ(&span.end);
            if cursor > max.value {
                return Some(Emptiness::Covered {
                    min: min.clone(),
                    max: max.clone(),
                    spans: used,
                });
            }
        }
        None
    }
}

// ──────────────────────────────────────────────
// Per-kind restrictions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericRange {
    pub range: Interval<Decimal>,
    /// Smallest distinguishable increment: 1 for counts, ε otherwise.
    pub step: Decimal,
    pub integral: bool,
    pub broad_threshold: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub range: Interval<PrimitiveDateTime>,
    /// Threshold in days.
    pub broad_threshold: Option<Decimal>,
}

/// Intersected allowed values and the conditions that contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSet {
    pub values: BTreeSet<String>,
    pub cited: Cited,
}

impl ValueSet {
    fn intersect(slot: &mut Option<ValueSet>, values: BTreeSet<String>, cited: String) {
        match slot {
            None => {
                *slot = Some(ValueSet {
                    values,
                    cited: BTreeSet::from([cited]),
                })
            }
            Some(set) => {
                set.values = set.values.intersection(&values).cloned().collect();
                set.cited.insert(cited);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstraint {
    /// The declared value set.
    pub domain: Vec<String>,
    pub allowed: Option<ValueSet>,
    pub excluded: Patterns,
}

impl EnumConstraint {
    /// Values still possible after every condition.
    pub fn remaining(&self) -> Vec<&String> {
        self.domain
            .iter()
            .filter(|v| self.allowed.as_ref().is_none_or(|a| a.values.contains(*v)))
            .filter(|v| !self.excluded.contains_key(*v))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BooleanConstraint {
    pub required_true: Cited,
    pub required_false: Cited,
}

impl BooleanConstraint {
    pub fn requires_true(&self) -> bool {
        !self.required_true.is_empty()
    }

    pub fn requires_false(&self) -> bool {
        !self.required_false.is_empty()
    }
}

/// Text restrictions. Keys are case-folded unless the checker runs
/// case-sensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextConstraint {
    pub case_sensitive: bool,
    /// Intersection of every `equals` / `in`.
    pub allowed: Option<ValueSet>,
    /// Each single `equals` value, kept apart for pairwise citations.
    pub equals_values: Patterns,
    pub excluded: Patterns,
    pub contains: Patterns,
    pub not_contains: Patterns,
    pub prefixes: Patterns,
    pub suffixes: Patterns,
    pub not_prefixes: Patterns,
    pub not_suffixes: Patterns,
}

impl TextConstraint {
    pub fn fold(&self, s: &str) -> String {
        if self.case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    Numeric(NumericRange),
    Enum(EnumConstraint),
    Boolean(BooleanConstraint),
    Text(TextConstraint),
    Date(DateRange),
}

impl Restriction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Restriction::Numeric(_) => "numeric",
            Restriction::Enum(_) => "enum",
            Restriction::Boolean(_) => "boolean",
            Restriction::Text(_) => "text",
            Restriction::Date(_) => "date",
        }
    }
}

/// The folded restriction of one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedConstraint {
    pub property: String,
    pub restriction: Restriction,
    /// Conditions the catalog already implies.
    pub vacuous: Cited,
}

/// Property → aggregated constraint, in property order.
pub type Aggregation = BTreeMap<String, AggregatedConstraint>;

// ──────────────────────────────────────────────
// Folding
// ──────────────────────────────────────────────

/// Fold every condition into a per-property restriction.
///
/// Conditions naming a property missing from `registry` are skipped; the
/// parser never produces them.
pub fn aggregate(
    conditions: &[Condition],
    registry: &Registry,
    config: &CheckerConfig,
) -> Aggregation {
    let mut out = Aggregation::new();

    for condition in conditions {
        let Some(domain) = registry.get(&condition.property) else {
            tracing::warn!(
                property = %condition.property,
                "condition on unregistered property skipped"
            );
            continue;
        };
        let entry = out
            .entry(condition.property.clone())
            .or_insert_with(|| seed(domain, config));
        fold(entry, domain, condition);
    }

    for (property, constraint) in &out {
        tracing::debug!(
            property = %property,
            kind = constraint.restriction.kind_name(),
            vacuous = constraint.vacuous.len(),
            "aggregated property constraint"
        );
    }

    out
}

/// The unconstrained restriction of a property, narrowed only by the
/// catalog's own bounds.
fn seed(domain: &PropertyDomain, config: &CheckerConfig) -> AggregatedConstraint {
    let restriction = match &domain.kind {
        PropertyKind::Numeric { integral, .. } => {
            let mut range = Interval::default();
            if let Some(min) = domain.catalog_min() {
                range.raise_min(min, catalog_citation(&domain.name, ">=", min), true);
            }
            if let Some(max) = domain.catalog_max() {
                range.lower_max(max, catalog_citation(&domain.name, "<=", max), true);
            }
            Restriction::Numeric(NumericRange {
                range,
                step: if *integral { Decimal::ONE } else { epsilon() },
                integral: *integral,
                broad_threshold: config.broad_threshold(domain),
            })
        }
        PropertyKind::Date => Restriction::Date(DateRange {
            range: Interval::default(),
            broad_threshold: config.broad_threshold(domain),
        }),
        PropertyKind::Enum { values } => Restriction::Enum(EnumConstraint {
            domain: values.clone(),
            allowed: None,
            excluded: Patterns::new(),
        }),
        PropertyKind::Boolean => Restriction::Boolean(BooleanConstraint::default()),
        PropertyKind::Text => Restriction::Text(TextConstraint {
            case_sensitive: config.case_sensitive_text,
            ..TextConstraint::default()
        }),
    };
    AggregatedConstraint {
        property: domain.name.clone(),
        restriction,
        vacuous: Cited::new(),
    }
}

fn catalog_citation(property: &str, op: &str, value: Decimal) -> String {
    format!("{} {} {} (catalog bound)", property, op, value.normalize())
}

fn fold(entry: &mut AggregatedConstraint, domain: &PropertyDomain, condition: &Condition) {
    let cited = condition.to_string();
    let vacuous = match &mut entry.restriction {
        Restriction::Numeric(numeric) => fold_numeric(numeric, domain, condition, &cited),
        Restriction::Date(date) => {
            fold_date(date, condition, &cited);
            false
        }
        Restriction::Enum(enumeration) => fold_enum(enumeration, condition, &cited),
        Restriction::Boolean(boolean) => {
            fold_boolean(boolean, condition, &cited);
            false
        }
        Restriction::Text(text) => fold_text(text, condition, &cited),
    };
    if vacuous {
        entry.vacuous.insert(cited);
    }
}

/// Returns whether the condition is implied by the catalog bounds alone.
/// Judged against the domain, never the running limits.
fn fold_numeric(
    numeric: &mut NumericRange,
    domain: &PropertyDomain,
    condition: &Condition,
    cited: &str,
) -> bool {
    let op = condition.normalized().operator;
    let integral = numeric.integral;
    let step = numeric.step;
    let catalog_min = domain.catalog_min();
    let catalog_max = domain.catalog_max();
    let floor = |v: Decimal| if integral { v.floor() } else { v };
    let ceil = |v: Decimal| if integral { v.ceil() } else { v };
    let below_catalog = |v: Decimal| catalog_min.is_some_and(|m| v <= m);
    let above_catalog = |v: Decimal| catalog_max.is_some_and(|m| v >= m);
    let range = &mut numeric.range;

    match op {
        Operator::Equals | Operator::Between => {
            let Some((low, high)) = numeric_operands(condition) else {
                return false;
            };
            let (low, high) = (ceil(low), floor(high));
            range.raise_min(low, cited.to_string(), false);
            range.lower_max(high, cited.to_string(), false);
            op == Operator::Between && below_catalog(low) && above_catalog(high)
        }
        Operator::NotEquals | Operator::NotBetween => {
            if let Some((low, high)) = numeric_operands(condition) {
                range.exclude(ceil(low), floor(high), cited.to_string());
            }
            false
        }
        Operator::GreaterThan | Operator::GreaterThanOrEqual => {
            let Some(v) = condition.value.as_number() else {
                return false;
            };
            let min = match (op, integral) {
                (Operator::GreaterThan, true) => step_up(v.floor(), Decimal::ONE),
                (Operator::GreaterThan, false) => step_up(v, step),
                _ => ceil(v),
            };
            range.raise_min(min, cited.to_string(), false);
            below_catalog(min)
        }
        Operator::LessThan | Operator::LessThanOrEqual => {
            let Some(v) = condition.value.as_number() else {
                return false;
            };
            let max = match (op, integral) {
                (Operator::LessThan, true) => step_down(v.ceil(), Decimal::ONE),
                (Operator::LessThan, false) => step_down(v, step),
                _ => floor(v),
            };
            range.lower_max(max, cited.to_string(), false);
            above_catalog(max)
        }
        Operator::In => {
            let points: BTreeSet<Decimal> = condition
                .value
                .elements()
                .iter()
                .filter_map(Scalar::as_number)
                .filter(|v| !integral || v.fract().is_zero())
                .map(|v| v.normalize())
                .collect();
            range.allow(points, cited.to_string());
            false
        }
        Operator::NotIn => {
            let elements = condition.value.elements();
            for v in elements.iter().filter_map(Scalar::as_number) {
                range.exclude(v.normalize(), v.normalize(), cited.to_string());
            }
            elements.is_empty()
        }
        Operator::Contains | Operator::NotContains | Operator::StartsWith | Operator::EndsWith => {
            false
        }
    }
}

/// `[v, v]` for equality, the ordered pair for ranges.
fn numeric_operands(condition: &Condition) -> Option<(Decimal, Decimal)> {
    match condition.range_values() {
        Some((low, high)) => Some((low.as_number()?, high.as_number()?)),
        None => {
            let v = condition.value.as_number()?;
            Some((v, v))
        }
    }
}

fn fold_date(date: &mut DateRange, condition: &Condition, cited: &str) {
    let op = condition.normalized().operator;
    let range = &mut date.range;
    let operands = match condition.range_values() {
        Some((low, high)) => low.as_date().zip(high.as_date()).map(|(l, h)| (l.start, h.end)),
        None => condition.value.as_date().map(|m| (m.start, m.end)),
    };
    let Some((start, end)) = operands else {
        return;
    };
    match op {
        Operator::Equals | Operator::Between => {
            range.raise_min(start, cited.to_string(), false);
            range.lower_max(end, cited.to_string(), false);
        }
        Operator::NotEquals | Operator::NotBetween => {
            range.exclude(start, end, cited.to_string());
        }
        Operator::GreaterThan => range.raise_min(next_second(&end), cited.to_string(), false),
        Operator::GreaterThanOrEqual => range.raise_min(start, cited.to_string(), false),
        Operator::LessThan => range.lower_max(previous_second(&start), cited.to_string(), false),
        Operator::LessThanOrEqual => range.lower_max(end, cited.to_string(), false),
        _ => {}
    }
}

pub fn next_second(at: &PrimitiveDateTime) -> PrimitiveDateTime {
    at.checked_add(Duration::SECOND).unwrap_or(*at)
}

fn previous_second(at: &PrimitiveDateTime) -> PrimitiveDateTime {
    at.checked_sub(Duration::SECOND).unwrap_or(*at)
}

fn text_values(condition: &Condition, fold: impl Fn(&str) -> String) -> BTreeSet<String> {
    condition
        .value
        .elements()
        .iter()
        .filter_map(Scalar::as_text)
        .map(fold)
        .collect()
}

fn fold_enum(enumeration: &mut EnumConstraint, condition: &Condition, cited: &str) -> bool {
    let op = condition.normalized().operator;
    let values = text_values(condition, str::to_string);
    match op {
        Operator::Equals | Operator::In => {
            let covers_domain = enumeration.domain.iter().all(|v| values.contains(v));
            ValueSet::intersect(&mut enumeration.allowed, values, cited.to_string());
            covers_domain
        }
        Operator::NotEquals | Operator::NotIn => {
            let empty = values.is_empty();
            for v in values {
                enumeration
                    .excluded
                    .entry(v)
                    .or_default()
                    .insert(cited.to_string());
            }
            empty
        }
        _ => false,
    }
}

fn fold_boolean(boolean: &mut BooleanConstraint, condition: &Condition, cited: &str) {
    let Some(v) = condition.value.as_bool() else {
        return;
    };
    let required = match condition.normalized().operator {
        Operator::Equals => v,
        Operator::NotEquals => !v,
        _ => return,
    };
    if required {
        boolean.required_true.insert(cited.to_string());
    } else {
        boolean.required_false.insert(cited.to_string());
    }
}

fn fold_text(text: &mut TextConstraint, condition: &Condition, cited: &str) -> bool {
    let normalized = condition.normalized();
    let case_sensitive = text.case_sensitive;
    let values = text_values(condition, |s| {
        if case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    });
    let single = values.iter().next().cloned().unwrap_or_default();
    let add = |patterns: &mut Patterns, key: String| {
        patterns.entry(key).or_default().insert(cited.to_string());
    };

    match (normalized.operator, normalized.negated) {
        (Operator::Equals, _) => {
            add(&mut text.equals_values, single);
            ValueSet::intersect(&mut text.allowed, values, cited.to_string());
            false
        }
        (Operator::In, _) => {
            ValueSet::intersect(&mut text.allowed, values, cited.to_string());
            false
        }
        (Operator::NotEquals | Operator::NotIn, _) => {
            let empty = values.is_empty();
            for v in values {
                add(&mut text.excluded, v);
            }
            empty
        }
        (Operator::Contains, _) => {
            add(&mut text.contains, single.clone());
            single.is_empty()
        }
        (Operator::NotContains, _) => {
            add(&mut text.not_contains, single);
            false
        }
        (Operator::StartsWith, false) => {
            add(&mut text.prefixes, single.clone());
            single.is_empty()
        }
        (Operator::StartsWith, true) => {
            add(&mut text.not_prefixes, single);
            false
        }
        (Operator::EndsWith, false) => {
            add(&mut text.suffixes, single.clone());
            single.is_empty()
        }
        (Operator::EndsWith, true) => {
            add(&mut text.not_suffixes, single);
            false
        }
        _ => false,
    }
}

/// First citation of a set, for messages.
pub fn first(cited: &Cited) -> &str {
    cited.iter().next().map(String::as_str).unwrap_or("")
}

/// Joins citations for messages.
pub fn join<T: Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
