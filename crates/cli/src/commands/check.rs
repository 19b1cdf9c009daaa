use std::path::Path;

use filtercheck_analyze::{CheckReport, Diagnostic, Severity};
use filtercheck_core::{registry, CheckerConfig, Combinator, FilterDocument};

use super::read_json;
use crate::{config, report_error, OutputFormat};

/// Exit status when the filter can match no product.
pub(crate) const EXIT_BLOCKED: i32 = 2;

pub(crate) fn cmd_check(
    file: &Path,
    config_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) -> i32 {
    let registry = registry::standard();

    // Step 1: Load settings
    let checker_config = match config_path {
        Some(path) => match config::load(path, registry) {
            Ok(c) => c,
            Err(msg) => {
                report_error(&msg, output, quiet);
                return 1;
            }
        },
        None => CheckerConfig::default(),
    };

    // Step 2: Read the document
    let value = match read_json(file) {
        Ok(v) => v,
        Err(msg) => {
            report_error(&msg, output, quiet);
            return 1;
        }
    };

    // Step 3: Run the checker; configuration errors are fatal
    let report = match FilterDocument::from_json(&value).and_then(|document| {
        filtercheck_analyze::check_document(&document, registry, &checker_config)
    }) {
        Ok(r) => r,
        Err(e) => {
            if !quiet {
                match output {
                    OutputFormat::Json => eprintln!("{}", e.to_json_value()),
                    OutputFormat::Text => eprintln!("configuration error: {}", e),
                }
            }
            return 1;
        }
    };

    // Step 4: Format output
    if !quiet {
        match output {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&report)
                    .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
                println!("{}", json);
            }
            OutputFormat::Text => print_text(&report),
        }
    }

    if report.blocks_save() {
        EXIT_BLOCKED
    } else {
        0
    }
}

fn print_text(report: &CheckReport) {
    println!("Filter Check Report");
    println!("===================");
    println!();

    if report.skipped {
        println!(
            "  Analysis skipped: {} condition(s) are combined with {}",
            report.conditions_checked,
            combinator_label(report.combinator)
        );
        return;
    }

    println!(
        "  Conditions: {} checked across {} propert{}, {} rules evaluated",
        report.conditions_checked,
        report.properties_checked,
        if report.properties_checked == 1 { "y" } else { "ies" },
        report.rules_evaluated
    );
    println!();

    if report.diagnostics.is_empty() {
        println!("  No findings.");
    } else {
        for diagnostic in &report.diagnostics {
            println!("  {}", format_diagnostic(diagnostic));
        }
    }
    println!();

    let impossible = report.count(Severity::Impossible);
    println!(
        "Result: {} impossible, {} warning(s), {} info{}",
        impossible,
        report.count(Severity::Warning),
        report.count(Severity::Info),
        if impossible > 0 { " -- save blocked" } else { "" }
    );
}

fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    format!(
        "[{}] {} ({}): {}",
        severity_label(diagnostic.severity),
        diagnostic.code,
        diagnostic.properties.join(", "),
        diagnostic.message
    )
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Impossible => "impossible",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

fn combinator_label(combinator: Combinator) -> &'static str {
    match combinator {
        Combinator::All => "AND",
        Combinator::Any => "OR",
    }
}
