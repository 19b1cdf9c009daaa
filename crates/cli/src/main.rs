mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Product filter consistency checker.
#[derive(Parser)]
#[command(
    name = "filtercheck",
    version,
    about = "Product filter consistency checker"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log analysis details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a filter document for contradictory or suspicious conditions
    Check {
        /// Path to the filter document (JSON)
        file: PathBuf,
        /// Checker settings (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate a filter document against the filter JSON Schema
    Validate {
        /// Path to the filter document (JSON)
        file: PathBuf,
    },
    /// List the properties a filter can constrain
    Properties,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Check { file, config } => {
            commands::check::cmd_check(&file, config.as_deref(), cli.output, cli.quiet)
        }
        Commands::Validate { file } => {
            commands::validate::cmd_validate(&file, cli.output, cli.quiet)
        }
        Commands::Properties => commands::properties::cmd_properties(cli.output),
    };
    process::exit(code);
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "filtercheck_core=debug,filtercheck_analyze=debug,filtercheck=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
