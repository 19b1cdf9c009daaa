//! Property domain registry.
//!
//! A read-only table from property name to value kind, built once per
//! process and shared by every check. Callers with a different catalog
//! schema build their own [`Registry`] from entries.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::error::ConfigError;
use crate::operator::Operator;

/// The value kind of a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyKind {
    Numeric { non_negative: bool, integral: bool },
    Enum { values: Vec<String> },
    Boolean,
    Text,
    Date,
}

impl PropertyKind {
    pub fn name(&self) -> &'static str {
        match self {
            PropertyKind::Numeric { .. } => "numeric",
            PropertyKind::Enum { .. } => "enum",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Text => "text",
            PropertyKind::Date => "date",
        }
    }

    /// Whether `op` is meaningful for values of this kind.
    pub fn supports(&self, op: Operator) -> bool {
        use Operator::*;
        match self {
            PropertyKind::Numeric { .. } => matches!(
                op,
                Equals
                    | NotEquals
                    | GreaterThan
                    | GreaterThanOrEqual
                    | LessThan
                    | LessThanOrEqual
                    | Between
                    | NotBetween
                    | In
                    | NotIn
            ),
            PropertyKind::Date => matches!(
                op,
                Equals
                    | NotEquals
                    | GreaterThan
                    | GreaterThanOrEqual
                    | LessThan
                    | LessThanOrEqual
                    | Between
                    | NotBetween
            ),
            PropertyKind::Enum { .. } => matches!(op, Equals | NotEquals | In | NotIn),
            PropertyKind::Boolean => matches!(op, Equals | NotEquals),
            PropertyKind::Text => matches!(
                op,
                Equals | NotEquals | In | NotIn | Contains | NotContains | StartsWith | EndsWith
            ),
        }
    }
}

/// Inclusive catalog bounds a numeric property can never leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumericBounds {
    pub min: Decimal,
    pub max: Decimal,
}

/// A registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDomain {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: PropertyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_bounds: Option<NumericBounds>,
    /// Width above which a constrained range is reported as suspiciously
    /// broad. Property units for numbers, days for dates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broad_threshold: Option<Decimal>,
}

impl PropertyDomain {
    fn new(name: &str, label: &str, kind: PropertyKind) -> Self {
        PropertyDomain {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            business_bounds: None,
            broad_threshold: None,
        }
    }

    pub fn numeric(name: &str, label: &str) -> Self {
        Self::new(
            name,
            label,
            PropertyKind::Numeric {
                non_negative: false,
                integral: false,
            },
        )
    }

    pub fn amount(name: &str, label: &str) -> Self {
        Self::new(
            name,
            label,
            PropertyKind::Numeric {
                non_negative: true,
                integral: false,
            },
        )
    }

    pub fn count(name: &str, label: &str, non_negative: bool) -> Self {
        Self::new(
            name,
            label,
            PropertyKind::Numeric {
                non_negative,
                integral: true,
            },
        )
    }

    pub fn enumeration(name: &str, label: &str, values: &[&str]) -> Self {
        Self::new(
            name,
            label,
            PropertyKind::Enum {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    pub fn boolean(name: &str, label: &str) -> Self {
        Self::new(name, label, PropertyKind::Boolean)
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, PropertyKind::Text)
    }

    pub fn date(name: &str, label: &str) -> Self {
        Self::new(name, label, PropertyKind::Date)
    }

    pub fn bounded(mut self, min: i64, max: i64) -> Self {
        self.business_bounds = Some(NumericBounds {
            min: Decimal::from(min),
            max: Decimal::from(max),
        });
        self
    }

    pub fn broad_above(mut self, threshold: i64) -> Self {
        self.broad_threshold = Some(Decimal::from(threshold));
        self
    }

    /// Declared values of an enum property.
    pub fn enum_values(&self) -> Option<&[String]> {
        match &self.kind {
            PropertyKind::Enum { values } => Some(values),
            _ => None,
        }
    }

    /// Effective inclusive catalog range: explicit business bounds first,
    /// otherwise `[0, ∞)` for non-negative numbers.
    pub fn catalog_min(&self) -> Option<Decimal> {
        match (&self.business_bounds, &self.kind) {
            (Some(bounds), _) => Some(bounds.min),
            (
                None,
                PropertyKind::Numeric {
                    non_negative: true, ..
                },
            ) => Some(Decimal::ZERO),
            _ => None,
        }
    }

    pub fn catalog_max(&self) -> Option<Decimal> {
        self.business_bounds.map(|b| b.max)
    }
}

impl fmt::Display for PropertyDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind.name())
    }
}

/// Property name → domain lookup.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    properties: BTreeMap<String, PropertyDomain>,
}

impl Registry {
    /// Build a registry from entries. A later entry with the same name
    /// replaces an earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = PropertyDomain>) -> Self {
        let properties = entries
            .into_iter()
            .map(|domain| (domain.name.clone(), domain))
            .collect();
        Registry { properties }
    }

    /// Resolve a property, failing on names the catalog does not know.
    pub fn resolve(&self, property: &str) -> Result<&PropertyDomain, ConfigError> {
        self.properties
            .get(property)
            .ok_or_else(|| ConfigError::UnregisteredProperty {
                property: property.to_string(),
            })
    }

    pub fn get(&self, property: &str) -> Option<&PropertyDomain> {
        self.properties.get(property)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDomain> {
        self.properties.values()
    }
}

pub const PRODUCT_TYPES: &[&str] = &["simple", "variable", "grouped", "external"];
pub const STOCK_STATUSES: &[&str] = &["instock", "outofstock", "onbackorder"];
pub const TAX_STATUSES: &[&str] = &["taxable", "shipping", "none"];
pub const TAX_CLASSES: &[&str] = &["standard", "reduced-rate", "zero-rate"];
pub const BACKORDER_MODES: &[&str] = &["no", "notify", "yes"];
pub const CATALOG_VISIBILITIES: &[&str] = &["visible", "catalog", "search", "hidden"];
pub const POST_STATUSES: &[&str] = &["publish", "draft", "pending", "private", "future"];

/// The built-in product catalog schema.
pub fn standard_entries() -> Vec<PropertyDomain> {
    vec![
        // Pricing
        PropertyDomain::amount("price", "Price").broad_above(100_000),
        PropertyDomain::amount("regular_price", "Regular price").broad_above(100_000),
        PropertyDomain::amount("sale_price", "Sale price").broad_above(100_000),
        PropertyDomain::boolean("on_sale", "On sale"),
        PropertyDomain::date("date_on_sale_from", "Sale start date").broad_above(3_650),
        PropertyDomain::date("date_on_sale_to", "Sale end date").broad_above(3_650),
        PropertyDomain::count("total_sales", "Total sales", true),
        // Inventory
        PropertyDomain::count("stock_quantity", "Stock quantity", false).broad_above(1_000_000),
        PropertyDomain::count("low_stock_amount", "Low stock threshold", true),
        PropertyDomain::enumeration("stock_status", "Stock status", STOCK_STATUSES),
        PropertyDomain::boolean("manage_stock", "Manage stock"),
        PropertyDomain::enumeration("backorders", "Backorders", BACKORDER_MODES),
        PropertyDomain::boolean("sold_individually", "Sold individually"),
        // Shipping and physical
        PropertyDomain::amount("weight", "Weight").broad_above(10_000),
        PropertyDomain::amount("length", "Length").broad_above(10_000),
        PropertyDomain::amount("width", "Width").broad_above(10_000),
        PropertyDomain::amount("height", "Height").broad_above(10_000),
        PropertyDomain::text("shipping_class", "Shipping class"),
        PropertyDomain::boolean("virtual", "Virtual"),
        PropertyDomain::boolean("downloadable", "Downloadable"),
        // Reviews
        PropertyDomain::amount("average_rating", "Average rating").bounded(0, 5),
        PropertyDomain::count("review_count", "Review count", true),
        PropertyDomain::boolean("reviews_allowed", "Reviews allowed"),
        // Lifecycle
        PropertyDomain::date("date_created", "Date created").broad_above(3_650),
        PropertyDomain::date("date_modified", "Date modified").broad_above(3_650),
        PropertyDomain::enumeration("status", "Status", POST_STATUSES),
        PropertyDomain::enumeration(
            "catalog_visibility",
            "Catalog visibility",
            CATALOG_VISIBILITIES,
        ),
        PropertyDomain::boolean("featured", "Featured"),
        PropertyDomain::numeric("menu_order", "Menu order"),
        // Identity and taxonomy
        PropertyDomain::enumeration("product_type", "Product type", PRODUCT_TYPES),
        PropertyDomain::text("name", "Name"),
        PropertyDomain::text("sku", "SKU"),
        PropertyDomain::text("slug", "Slug"),
        PropertyDomain::text("description", "Description"),
        PropertyDomain::text("short_description", "Short description"),
        PropertyDomain::text("purchase_note", "Purchase note"),
        PropertyDomain::text("category", "Category"),
        PropertyDomain::text("tag", "Tag"),
        // Tax
        PropertyDomain::enumeration("tax_status", "Tax status", TAX_STATUSES),
        PropertyDomain::enumeration("tax_class", "Tax class", TAX_CLASSES),
    ]
}

/// The process-wide built-in registry.
pub fn standard() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry::from_entries(standard_entries()))
}
