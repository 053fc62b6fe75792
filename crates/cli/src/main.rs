mod commands;
mod contract;
mod settings;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Contract pattern matching and test generation.
#[derive(Parser)]
#[command(
    name = "pactum",
    version,
    about = "Contract pattern matching and test generation"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    verbose: bool,

    /// TOML file with a [generation] table
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a JSON value against a contract's root pattern
    Match {
        /// Path to the contract document
        contract: PathBuf,
        /// Path to the JSON value to check
        value: PathBuf,
        /// Accept DSL tokens such as "(number)" in place of values
        #[arg(long)]
        mock: bool,
    },

    /// Generate example values from a contract
    Generate {
        /// Path to the contract document
        contract: PathBuf,
        /// Number of values to generate
        #[arg(long, default_value = "1")]
        count: usize,
    },

    /// Enumerate positive or negative test inputs for a contract
    Tests {
        /// Path to the contract document
        contract: PathBuf,
        /// JSON example used instead of the contract's own examples
        #[arg(long)]
        row: Option<PathBuf>,
        /// Emit inputs expected to be rejected
        #[arg(long)]
        negative: bool,
        /// Maximum number of inputs per example row
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Check that a newer contract is backward compatible with an older one
    Compat {
        /// Path to the older contract document
        older: PathBuf,
        /// Path to the newer contract document
        newer: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let config = match settings::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };
    tracing::debug!(?config, "generation settings");

    match cli.command {
        Commands::Match {
            contract,
            value,
            mock,
        } => {
            commands::matching::cmd_match(&contract, &value, mock, config, cli.output, cli.quiet);
        }
        Commands::Generate { contract, count } => {
            commands::generate::cmd_generate(&contract, count, config, cli.output, cli.quiet);
        }
        Commands::Tests {
            contract,
            row,
            negative,
            limit,
        } => {
            commands::tests::cmd_tests(
                &contract,
                row.as_deref(),
                negative,
                limit,
                config,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Compat { older, newer } => {
            commands::compat::cmd_compat(&older, &newer, config, cli.output, cli.quiet);
        }
    }
}

/// Report an error on stderr in the selected format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            let err_json = serde_json::json!({ "error": msg });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&err_json).unwrap_or_default()
            );
        }
    }
}

/// Report an error and exit with status 1.
pub(crate) fn fail(msg: &str, output: OutputFormat, quiet: bool) -> ! {
    report_error(msg, output, quiet);
    process::exit(1);
}

/// Print a JSON document to stdout, pretty-printed.
pub(crate) fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!("serialization error: {}", e))
    );
}
