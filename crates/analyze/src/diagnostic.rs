//! Diagnostic records and message templates.
//!
//! Messages are produced from a template with positional `{0}`, `{1}`, ...
//! placeholders. The template and its arguments travel with the rendered
//! message so a caller can translate without string-matching.

use serde::Serialize;

/// How bad a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// The filter can match no product; the save must be blocked.
    Impossible,
    /// Satisfiable, but probably not what the author meant.
    Warning,
    Info,
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub properties: Vec<String>,
    pub message: String,
    pub template: &'static str,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Code of a generic finding on the same properties this one replaces.
    #[serde(skip)]
    pub supersedes: Option<&'static str>,
}

impl Diagnostic {
    pub fn new(
        code: &'static str,
        severity: Severity,
        properties: Vec<String>,
        template: &'static str,
        args: Vec<String>,
    ) -> Self {
        Diagnostic {
            code,
            severity,
            message: interpolate(template, &args),
            properties,
            template,
            args,
            details: None,
            supersedes: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn superseding(mut self, code: Option<&'static str>) -> Self {
        self.supersedes = code;
        self
    }

    pub fn is_impossible(&self) -> bool {
        self.severity == Severity::Impossible
    }

    /// Identity used for deduplication.
    pub(crate) fn key(&self) -> (Severity, &[String], &str, &str) {
        (self.severity, &self.properties, self.code, &self.message)
    }
}

/// Substitute `{N}` placeholders with `args[N]`. Placeholders without an
/// argument and unmatched braces are copied through unchanged.
pub fn interpolate(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}');
        let substituted = close.and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            args.get(index).map(|arg| (arg, close))
        });
        match substituted {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
