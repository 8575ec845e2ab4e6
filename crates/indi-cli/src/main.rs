//! INDI command-line interface.
//!
//! ```bash
//! # interactive shell over the bundled in-memory stores
//! indi
//!
//! # engine from a config file, one statement, JSON out
//! indi --config indi.toml -o json -c 'READ IN nonsense ALL RECORDS FIELDS (a, b, c)'
//!
//! # statements from a file, one per line
//! indi --config indi.toml -f statements.indi
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod formatter;
mod repl;

use indi_engine::{EngineConfig, Indi};

use formatter::OutputFormat;
use repl::Repl;

/// Command-line interface for the INDI engine
#[derive(ClapParser, Debug)]
#[command(
    name = "indi",
    version,
    about = "Evaluate INDI statements against every configured store at once"
)]
struct Args {
    /// Engine configuration file (TOML). Without one, the bundled in-memory
    /// stores are used.
    #[arg(long, value_name = "FILE", env = "INDI_CONFIG")]
    config: Option<PathBuf>,

    /// Run a DDL batch against the relational store before anything else
    #[arg(long, value_name = "FILE")]
    provision: Option<PathBuf>,

    /// Evaluate a single statement and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Evaluate statements from a file (one per line) and exit
    #[arg(short = 'f', long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "table")]
    output: OutputFormatArg,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Suppress the banner (for scripting)
    #[arg(short = 'q', long)]
    quiet: bool,
}

/// Output format argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Display results in a formatted table
    Table,
    /// Display results as JSON
    Json,
    /// Display raw tab-separated values
    Raw,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Raw => OutputFormat::Raw,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::for_testing(),
    };
    let engine = Indi::open(config).context("opening engine")?;

    if let Some(path) = &args.provision {
        let ddl = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        engine.provision(&ddl).context("provisioning")?;
    }

    let format: OutputFormat = args.output.into();
    if let Some(command) = &args.command {
        let repl = Repl::new(engine, format)?;
        repl.evaluate_and_print(command);
        Ok(())
    } else if let Some(file) = &args.file {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?;
        let repl = Repl::new(engine, format)?;
        for line in content.lines() {
            let line = line.trim();
            if !line.is_empty() && !line.starts_with('#') {
                repl.evaluate_and_print(line);
            }
        }
        Ok(())
    } else {
        let mut repl = Repl::new(engine, format)?;
        if !args.quiet {
            repl.print_banner();
        }
        repl.run()
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("indi_cli=debug,indi_engine=debug,indi_store=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
