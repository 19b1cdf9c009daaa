//! Checker configuration.
//!
//! Every field has a default, so an empty TOML file (or none at all) is a
//! valid configuration.
//!
//! ```toml
//! max_conditions = 100
//! case_sensitive_text = false
//! report_vacuous = true
//!
//! [broad_ranges]
//! price = 50000        # property units
//! date_created = 365   # days
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::registry::{PropertyDomain, Registry};

pub const DEFAULT_MAX_CONDITIONS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    /// Longest condition list accepted before the call fails.
    pub max_conditions: usize,
    /// Compare text values and patterns case-sensitively.
    pub case_sensitive_text: bool,
    /// Emit `Info` findings for conditions the catalog already implies.
    pub report_vacuous: bool,
    /// Per-property overrides of the registry's broad-range thresholds.
    pub broad_ranges: BTreeMap<String, Decimal>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig {
            max_conditions: DEFAULT_MAX_CONDITIONS,
            case_sensitive_text: false,
            report_vacuous: true,
            broad_ranges: BTreeMap::new(),
        }
    }
}

impl CheckerConfig {
    /// Reject overrides naming properties the registry does not know.
    pub fn validate(&self, registry: &Registry) -> Result<(), ConfigError> {
        for property in self.broad_ranges.keys() {
            if !registry.contains(property) {
                return Err(ConfigError::UnknownConfigProperty {
                    property: property.clone(),
                });
            }
        }
        Ok(())
    }

    /// Threshold in effect for a property: the override, else the registry's.
    pub fn broad_threshold(&self, domain: &PropertyDomain) -> Option<Decimal> {
        self.broad_ranges
            .get(&domain.name)
            .copied()
            .or(domain.broad_threshold)
    }
}
