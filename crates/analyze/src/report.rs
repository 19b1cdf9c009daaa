//! CheckReport -- merged, ordered output of one checker run.
//!
//! Satisfiability findings and rule findings are merged here. A rule that
//! restates a generic finding more specifically replaces it, duplicates
//! collapse, and the result is sorted so equal inputs always produce
//! byte-identical reports.

use filtercheck_core::Combinator;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::diagnostic::{Diagnostic, Severity};

/// Merge satisfiability and rule diagnostics into the final list.
pub fn merge(satisfiability: Vec<Diagnostic>, rules: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut all: Vec<Diagnostic> = satisfiability.into_iter().chain(rules).collect();

    let superseded: BTreeSet<(&'static str, Vec<String>)> = all
        .iter()
        .filter_map(|d| d.supersedes.map(|code| (code, d.properties.clone())))
        .collect();
    all.retain(|d| !superseded.contains(&(d.code, d.properties.clone())));

    all.sort_by(|a, b| a.key().cmp(&b.key()));
    all.dedup_by(|a, b| a.key() == b.key());
    all
}

/// Outcome of checking one filter document.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub combinator: Combinator,
    /// Set when analysis was bypassed (OR documents).
    pub skipped: bool,
    pub conditions_checked: usize,
    pub properties_checked: usize,
    pub rules_evaluated: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    /// Report for a document whose conditions parsed but were not analyzed.
    pub fn skipped(combinator: Combinator, conditions: usize) -> Self {
        CheckReport {
            combinator,
            skipped: true,
            conditions_checked: conditions,
            properties_checked: 0,
            rules_evaluated: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Whether the filter must not be saved.
    pub fn blocks_save(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_impossible)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }
}
