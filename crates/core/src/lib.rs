//! filtercheck-core: condition model, property registry and configuration
//! for the product filter consistency checker.
//!
//! # Public API
//!
//! - [`parse()`] / [`parse_document()`] -- raw records to typed [`Condition`]s
//! - [`Registry`] and [`registry::standard()`] -- property name to domain
//! - [`CheckerConfig`] -- tunables, loadable from TOML/JSON via serde
//! - [`ConfigError`] -- fatal configuration errors

pub mod condition;
pub mod config;
pub mod error;
pub mod operator;
pub mod registry;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use condition::{
    parse, parse_document, Combinator, Condition, FilterDocument, Mode, Normalized, RawCondition,
};
pub use config::CheckerConfig;
pub use error::ConfigError;
pub use operator::Operator;
pub use registry::{NumericBounds, PropertyDomain, PropertyKind, Registry};
pub use value::{Moment, Scalar, Timestamp};
