//! twig-cs CLI tool.
//!
//! Usage:
//! ```bash
//! twig-cs check [OPTIONS] [PATH]
//! twig-cs list-sniffs
//! twig-cs init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;
mod discovery;

/// Coding standard checker for Twig templates
#[derive(Parser)]
#[command(name = "twig-cs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TWIG_CS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint templates
    Check {
        /// File or directory to lint (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run specific sniffs, by name or code (comma-separated)
        #[arg(long)]
        sniffs: Option<String>,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Lint files one after another instead of in parallel
        #[arg(long)]
        sequential: bool,

        /// Resolve the path and config as if run from this directory
        /// (default: current directory)
        #[arg(long, value_name = "DIR")]
        working_dir: Option<PathBuf>,
    },

    /// List available sniffs
    ListSniffs,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-finding compact format.
    Compact,
}

/// Resolves a relative `path` against `--working-dir` when one is given.
fn in_working_dir(working_dir: Option<&Path>, path: &Path) -> PathBuf {
    match working_dir {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            format,
            sniffs,
            exclude,
            sequential,
            working_dir,
        } => {
            let path = in_working_dir(working_dir.as_deref(), &path);
            let explicit = cli
                .config
                .as_deref()
                .map(|config| in_working_dir(working_dir.as_deref(), config));
            let source = config_resolver::resolve(&path, explicit.as_deref());
            let options = commands::check::CheckOptions {
                format,
                sniffs,
                exclude,
                sequential,
                working_dir,
            };
            let report = commands::check::run(&path, &options, &source)?;
            Ok(if report.has_errors() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::ListSniffs => {
            commands::list_sniffs::run();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            commands::init::run(force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
