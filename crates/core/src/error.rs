use crate::operator::Operator;

/// A configuration error: the caller handed the checker something the
/// schema does not allow. These are fatal to the call and never reported
/// as diagnostics.
///
/// `index` is the zero-based position of the offending record in the
/// condition list.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("condition #{index}: unknown property '{property}'")]
    UnknownProperty { index: usize, property: String },

    #[error("condition #{index}: unknown operator '{operator}' for property '{property}'")]
    UnknownOperator {
        index: usize,
        property: String,
        operator: String,
    },

    #[error("condition #{index}: operator '{operator}' cannot be applied to {kind} property '{property}'")]
    UnsupportedOperator {
        index: usize,
        property: String,
        operator: Operator,
        kind: &'static str,
    },

    #[error("condition #{index}: malformed value {value} for property '{property}': expected {expected}")]
    MalformedValue {
        index: usize,
        property: String,
        value: String,
        expected: &'static str,
    },

    #[error("condition #{index}: '{value}' is not a known value of '{property}' (known: {known})")]
    UnknownEnumValue {
        index: usize,
        property: String,
        value: String,
        known: String,
    },

    #[error("condition #{index}: operator '{operator}' on '{property}' {expected}")]
    ArityMismatch {
        index: usize,
        property: String,
        operator: Operator,
        expected: &'static str,
    },

    #[error("condition #{index}: operator '{operator}' on '{property}' requires a value")]
    MissingValue {
        index: usize,
        property: String,
        operator: Operator,
    },

    #[error("{count} conditions exceed the configured maximum of {max}")]
    TooManyConditions { count: usize, max: usize },

    /// A registry lookup outside any condition list.
    #[error("unknown property '{property}'")]
    UnregisteredProperty { property: String },

    #[error("configuration references unknown property '{property}'")]
    UnknownConfigProperty { property: String },

    #[error("invalid filter document: {0}")]
    InvalidDocument(String),
}

impl ConfigError {
    /// Position of the offending condition, when the error is tied to one.
    pub fn condition_index(&self) -> Option<usize> {
        match self {
            ConfigError::UnknownProperty { index, .. }
            | ConfigError::UnknownOperator { index, .. }
            | ConfigError::UnsupportedOperator { index, .. }
            | ConfigError::MalformedValue { index, .. }
            | ConfigError::UnknownEnumValue { index, .. }
            | ConfigError::ArityMismatch { index, .. }
            | ConfigError::MissingValue { index, .. } => Some(*index),
            ConfigError::TooManyConditions { .. }
            | ConfigError::UnregisteredProperty { .. }
            | ConfigError::UnknownConfigProperty { .. }
            | ConfigError::InvalidDocument(_) => None,
        }
    }

    /// JSON shape used by the CLI's `--output json` error path.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.to_string(),
            "condition": self.condition_index(),
        })
    }
}
