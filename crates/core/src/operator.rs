//! The closed set of filter operators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A filter operator. Ordering is declaration order and is only used to
/// keep tie-breaks deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    NotBetween,
    In,
    NotIn,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
}

impl Operator {
    pub const ALL: [Operator; 14] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::Between,
        Operator::NotBetween,
        Operator::In,
        Operator::NotIn,
        Operator::Contains,
        Operator::NotContains,
        Operator::StartsWith,
        Operator::EndsWith,
    ];

    /// Canonical wire token.
    pub fn token(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::GreaterThan => "greater_than",
            Operator::GreaterThanOrEqual => "greater_than_or_equal",
            Operator::LessThan => "less_than",
            Operator::LessThanOrEqual => "less_than_or_equal",
            Operator::Between => "between",
            Operator::NotBetween => "not_between",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
        }
    }

    /// Parse a wire token. Accepts the canonical tokens, the symbolic
    /// comparison aliases and a few spellings older editors emit.
    pub fn from_token(token: &str) -> Option<Operator> {
        let normalized = token.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let op = match normalized.as_str() {
            "equals" | "eq" | "=" | "==" | "is" => Operator::Equals,
            "not_equals" | "ne" | "!=" | "<>" | "is_not" => Operator::NotEquals,
            "greater_than" | "gt" | ">" => Operator::GreaterThan,
            "greater_than_or_equal" | "greater_than_or_equals" | "gte" | ">=" => {
                Operator::GreaterThanOrEqual
            }
            "less_than" | "lt" | "<" => Operator::LessThan,
            "less_than_or_equal" | "less_than_or_equals" | "lte" | "<=" => {
                Operator::LessThanOrEqual
            }
            "between" => Operator::Between,
            "not_between" => Operator::NotBetween,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "contains" => Operator::Contains,
            "not_contains" | "does_not_contain" => Operator::NotContains,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            _ => return None,
        };
        Some(op)
    }

    /// Human phrase used when rendering a condition in a message.
    pub fn phrase(self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::Between => "between",
            Operator::NotBetween => "not between",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Contains => "contains",
            Operator::NotContains => "does not contain",
            Operator::StartsWith => "starts with",
            Operator::EndsWith => "ends with",
        }
    }

    /// The operator matching exactly the values this one rejects, if the
    /// language has one. `StartsWith`/`EndsWith` have no complement.
    pub fn complement(self) -> Option<Operator> {
        let op = match self {
            Operator::Equals => Operator::NotEquals,
            Operator::NotEquals => Operator::Equals,
            Operator::GreaterThan => Operator::LessThanOrEqual,
            Operator::LessThanOrEqual => Operator::GreaterThan,
            Operator::GreaterThanOrEqual => Operator::LessThan,
            Operator::LessThan => Operator::GreaterThanOrEqual,
            Operator::Between => Operator::NotBetween,
            Operator::NotBetween => Operator::Between,
            Operator::In => Operator::NotIn,
            Operator::NotIn => Operator::In,
            Operator::Contains => Operator::NotContains,
            Operator::NotContains => Operator::Contains,
            Operator::StartsWith | Operator::EndsWith => return None,
        };
        Some(op)
    }

    /// Range operators carry a second value.
    pub fn is_range(self) -> bool {
        matches!(self, Operator::Between | Operator::NotBetween)
    }

    /// Set operators carry a list of values.
    pub fn is_set(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
