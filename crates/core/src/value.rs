//! Typed condition values and the loose-input coercions that produce them.
//!
//! Numbers are `rust_decimal::Decimal`, never `f64`: bound comparisons must
//! be exact for "equals a value outside an established range" to be
//! reported reliably.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, time};
use time::{Date, PrimitiveDateTime, UtcOffset};

/// A calendar value. A date-only input covers its whole day; a timestamp
/// is a single instant (`start == end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Moment {
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

impl Moment {
    pub fn instant(at: PrimitiveDateTime) -> Self {
        Moment { start: at, end: at }
    }

    pub fn day(date: Date) -> Self {
        Moment {
            start: date.midnight(),
            end: date.with_time(time!(23:59:59)),
        }
    }

    pub fn is_whole_day(&self) -> bool {
        self.start != self.end
    }

    /// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`
    /// or RFC 3339 (normalized to UTC).
    pub fn parse(input: &str) -> Option<Moment> {
        let input = input.trim();
        let date_only = format_description!("[year]-[month]-[day]");
        if let Ok(date) = Date::parse(input, &date_only) {
            return Some(Moment::day(date));
        }
        let spaced = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        if let Ok(at) = PrimitiveDateTime::parse(input, &spaced) {
            return Some(Moment::instant(at));
        }
        let t_separated = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
        if let Ok(at) = PrimitiveDateTime::parse(input, &t_separated) {
            return Some(Moment::instant(at));
        }
        if let Ok(at) = time::OffsetDateTime::parse(input, &Rfc3339) {
            let utc = at.to_offset(UtcOffset::UTC);
            return Some(Moment::instant(PrimitiveDateTime::new(utc.date(), utc.time())));
        }
        None
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole_day() {
            write_date(f, self.start.date())
        } else {
            write_timestamp(f, self.start)
        }
    }
}

pub(crate) fn write_date(f: &mut fmt::Formatter<'_>, date: Date) -> fmt::Result {
    write!(
        f,
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub(crate) fn write_timestamp(f: &mut fmt::Formatter<'_>, at: PrimitiveDateTime) -> fmt::Result {
    write_date(f, at.date())?;
    write!(f, " {:02}:{:02}:{:02}", at.hour(), at.minute(), at.second())
}

/// Renders a bare timestamp the way conditions render dates.
pub struct Timestamp(pub PrimitiveDateTime);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.time() == time!(00:00:00) {
            write_date(f, self.0.date())
        } else {
            write_timestamp(f, self.0)
        }
    }
}

/// A typed condition value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Number(Decimal),
    Text(String),
    Boolean(bool),
    Date(Moment),
    /// Element list of an `in` / `not_in` condition.
    List(Vec<Scalar>),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Number(_) => "number",
            Scalar::Text(_) => "text",
            Scalar::Boolean(_) => "boolean",
            Scalar::Date(_) => "date",
            Scalar::List(_) => "list",
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Moment> {
        match self {
            Scalar::Date(m) => Some(*m),
            _ => None,
        }
    }

    /// The list elements, or the scalar itself as a one-element slice.
    pub fn elements(&self) -> &[Scalar] {
        match self {
            Scalar::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n.normalize()),
            Scalar::Text(s) => write!(f, "\"{}\"", s),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Date(m) => write!(f, "{}", m),
            Scalar::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Scalar::Number(n) => serializer.serialize_str(&n.normalize().to_string()),
            Scalar::Text(s) => serializer.serialize_str(s),
            Scalar::Boolean(b) => serializer.serialize_bool(*b),
            Scalar::Date(m) => serializer.serialize_str(&m.to_string()),
            Scalar::List(items) => serializer.collect_seq(items),
        }
    }
}

// ──────────────────────────────────────────────
// Loose coercions
// ──────────────────────────────────────────────

/// Coerce a JSON number or numeric string.
pub fn coerce_number(raw: &serde_json::Value) -> Option<Decimal> {
    match raw {
        serde_json::Value::Number(n) => parse_decimal(&n.to_string()),
        serde_json::Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Coerce a JSON bool, 0/1, or one of the usual truthy/falsy strings.
pub fn coerce_bool(raw: &serde_json::Value) -> Option<bool> {
    match raw {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Coerce a JSON string (numbers and bools are accepted and stringified,
/// editors often send SKUs as numbers).
pub fn coerce_text(raw: &serde_json::Value) -> Option<String> {
    match raw {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn coerce_date(raw: &serde_json::Value) -> Option<Moment> {
    raw.as_str().and_then(Moment::parse)
}

/// Split a loose list: a JSON array, or a comma-separated string.
/// Blank items of a comma-separated string are dropped.
pub fn split_list(raw: &serde_json::Value) -> Option<Vec<serde_json::Value>> {
    match raw {
        serde_json::Value::Array(items) => Some(items.clone()),
        serde_json::Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| serde_json::Value::String(item.to_string()))
                .collect(),
        ),
        serde_json::Value::Null => None,
        other => Some(vec![other.clone()]),
    }
}
