//! Condition model: raw records in, typed conditions out.
//!
//! Parsing is all-or-nothing. The first record the schema rejects fails the
//! whole list with a [`ConfigError`]; content contradictions are never
//! detected here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::CheckerConfig;
use crate::error::ConfigError;
use crate::operator::Operator;
use crate::registry::{PropertyDomain, PropertyKind, Registry};
use crate::value::{self, Scalar};

/// Include keeps products matching the condition, exclude drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Include,
    Exclude,
}

/// How the conditions of a document combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// AND semantics; analyzed.
    #[default]
    All,
    /// OR semantics; analysis is skipped.
    Any,
}

/// A condition record as the editor sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCondition {
    pub property: String,
    pub operator: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<serde_json::Value>,
    #[serde(default)]
    pub mode: Mode,
}

impl RawCondition {
    pub fn new(property: &str, operator: &str, value: serde_json::Value) -> Self {
        RawCondition {
            property: property.to_string(),
            operator: operator.to_string(),
            value,
            value2: None,
            mode: Mode::Include,
        }
    }
}

/// A whole filter as submitted for checking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterDocument {
    #[serde(default, alias = "match", alias = "logic")]
    pub combinator: Combinator,
    #[serde(default)]
    pub conditions: Vec<RawCondition>,
}

impl FilterDocument {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConfigError> {
        FilterDocument::deserialize(value).map_err(|e| ConfigError::InvalidDocument(e.to_string()))
    }
}

/// A parsed, validated condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub property: String,
    pub operator: Operator,
    pub value: Scalar,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value2: Option<Scalar>,
    pub mode: Mode,
}

/// A condition with its include/exclude mode folded into the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized {
    pub operator: Operator,
    /// Set only for excluded `starts_with` / `ends_with`, which have no
    /// complement operator.
    pub negated: bool,
}

impl Condition {
    pub fn new(property: &str, operator: Operator, value: Scalar) -> Self {
        Condition {
            property: property.to_string(),
            operator,
            value,
            value2: None,
            mode: Mode::Include,
        }
    }

    pub fn between(property: &str, operator: Operator, low: Scalar, high: Scalar) -> Self {
        Condition {
            property: property.to_string(),
            operator,
            value: low,
            value2: Some(high),
            mode: Mode::Include,
        }
    }

    pub fn excluded(mut self) -> Self {
        self.mode = Mode::Exclude;
        self
    }

    /// Fold the mode into the operator.
    pub fn normalized(&self) -> Normalized {
        match (self.mode, self.operator.complement()) {
            (Mode::Include, _) => Normalized {
                operator: self.operator,
                negated: false,
            },
            (Mode::Exclude, Some(complement)) => Normalized {
                operator: complement,
                negated: false,
            },
            (Mode::Exclude, None) => Normalized {
                operator: self.operator,
                negated: true,
            },
        }
    }

    /// Lower and upper value of a range operator, in ascending order.
    pub fn range_values(&self) -> Option<(&Scalar, &Scalar)> {
        let high = self.value2.as_ref()?;
        let swap = match (&self.value, high) {
            (Scalar::Number(a), Scalar::Number(b)) => a > b,
            (Scalar::Date(a), Scalar::Date(b)) => a.start > b.start,
            _ => false,
        };
        if swap {
            Some((high, &self.value))
        } else {
            Some((&self.value, high))
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mode == Mode::Exclude {
            f.write_str("not (")?;
        }
        match &self.value2 {
            Some(high) => write!(
                f,
                "{} {} {} and {}",
                self.property,
                self.operator.phrase(),
                self.value,
                high
            )?,
            None => write!(
                f,
                "{} {} {}",
                self.property,
                self.operator.phrase(),
                self.value
            )?,
        }
        if self.mode == Mode::Exclude {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Parse raw records against a registry.
pub fn parse(records: &[RawCondition], registry: &Registry) -> Result<Vec<Condition>, ConfigError> {
    let parsed = records
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_one(index, raw, registry))
        .collect::<Result<Vec<_>, _>>();
    match &parsed {
        Ok(conditions) => tracing::debug!(count = conditions.len(), "parsed filter conditions"),
        Err(e) => tracing::debug!(error = %e, "rejected filter conditions"),
    }
    parsed
}

/// Parse a document's conditions, enforcing the configured list limit.
pub fn parse_document(
    document: &FilterDocument,
    registry: &Registry,
    config: &CheckerConfig,
) -> Result<Vec<Condition>, ConfigError> {
    if document.conditions.len() > config.max_conditions {
        return Err(ConfigError::TooManyConditions {
            count: document.conditions.len(),
            max: config.max_conditions,
        });
    }
    parse(&document.conditions, registry)
}

fn parse_one(index: usize, raw: &RawCondition, registry: &Registry) -> Result<Condition, ConfigError> {
    let property = raw.property.trim();
    let domain = registry
        .get(property)
        .ok_or_else(|| ConfigError::UnknownProperty {
            index,
            property: property.to_string(),
        })?;

    let operator =
        Operator::from_token(&raw.operator).ok_or_else(|| ConfigError::UnknownOperator {
            index,
            property: property.to_string(),
            operator: raw.operator.clone(),
        })?;

    if !domain.kind.supports(operator) {
        return Err(ConfigError::UnsupportedOperator {
            index,
            property: property.to_string(),
            operator,
            kind: domain.kind.name(),
        });
    }

    let ctx = ValueContext {
        index,
        property,
        operator,
        domain,
    };

    let (value, value2) = if operator.is_range() {
        let (low, high) = range_operands(&ctx, raw)?;
        (ctx.single(&low)?, Some(ctx.single(&high)?))
    } else {
        if raw.value2.as_ref().is_some_and(|v| !v.is_null()) {
            return Err(ctx.arity("takes a single value, but value2 was supplied"));
        }
        if operator.is_set() {
            (ctx.list(&raw.value)?, None)
        } else {
            (ctx.single(&raw.value)?, None)
        }
    };

    Ok(Condition {
        property: property.to_string(),
        operator,
        value,
        value2,
        mode: raw.mode,
    })
}

/// `between` accepts `value` + `value2`, or a two-element `value`.
fn range_operands(
    ctx: &ValueContext<'_>,
    raw: &RawCondition,
) -> Result<(serde_json::Value, serde_json::Value), ConfigError> {
    match (&raw.value, &raw.value2) {
        (serde_json::Value::Null, _) => Err(ctx.missing()),
        (low, Some(high)) if !high.is_null() => {
            if low.is_array() {
                return Err(ctx.arity("takes two values, but value is already a list"));
            }
            Ok((low.clone(), high.clone()))
        }
        (serde_json::Value::Array(items), _) if items.len() == 2 => {
            Ok((items[0].clone(), items[1].clone()))
        }
        _ => Err(ctx.arity("requires two values (value and value2)")),
    }
}

struct ValueContext<'a> {
    index: usize,
    property: &'a str,
    operator: Operator,
    domain: &'a PropertyDomain,
}

impl ValueContext<'_> {
    fn missing(&self) -> ConfigError {
        ConfigError::MissingValue {
            index: self.index,
            property: self.property.to_string(),
            operator: self.operator,
        }
    }

    fn arity(&self, expected: &'static str) -> ConfigError {
        ConfigError::ArityMismatch {
            index: self.index,
            property: self.property.to_string(),
            operator: self.operator,
            expected,
        }
    }

    fn malformed(&self, raw: &serde_json::Value, expected: &'static str) -> ConfigError {
        ConfigError::MalformedValue {
            index: self.index,
            property: self.property.to_string(),
            value: raw.to_string(),
            expected,
        }
    }

    fn list(&self, raw: &serde_json::Value) -> Result<Scalar, ConfigError> {
        let items = value::split_list(raw).ok_or_else(|| self.missing())?;
        let mut parsed = Vec::with_capacity(items.len());
        for item in &items {
            let scalar = self.single(item)?;
            if !parsed.contains(&scalar) {
                parsed.push(scalar);
            }
        }
        Ok(Scalar::List(parsed))
    }

    fn single(&self, raw: &serde_json::Value) -> Result<Scalar, ConfigError> {
        if raw.is_null() {
            return Err(self.missing());
        }
        if raw.is_array() || raw.is_object() {
            return Err(self.arity("takes a single value, but a list was supplied"));
        }
        match &self.domain.kind {
            PropertyKind::Numeric { .. } => value::coerce_number(raw)
                .map(Scalar::Number)
                .ok_or_else(|| self.malformed(raw, "a number")),
            PropertyKind::Boolean => value::coerce_bool(raw)
                .map(Scalar::Boolean)
                .ok_or_else(|| self.malformed(raw, "a boolean")),
            PropertyKind::Date => value::coerce_date(raw)
                .map(Scalar::Date)
                .ok_or_else(|| self.malformed(raw, "a date (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)")),
            PropertyKind::Text => value::coerce_text(raw)
                .map(Scalar::Text)
                .ok_or_else(|| self.malformed(raw, "text")),
            PropertyKind::Enum { values } => {
                let text = value::coerce_text(raw).ok_or_else(|| self.malformed(raw, "text"))?;
                let normalized = text.trim().to_lowercase();
                if values.iter().any(|v| *v == normalized) {
                    Ok(Scalar::Text(normalized))
                } else {
                    Err(ConfigError::UnknownEnumValue {
                        index: self.index,
                        property: self.property.to_string(),
                        value: text,
                        known: values.join(", "),
                    })
                }
            }
        }
    }
}
