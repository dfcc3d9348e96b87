//! Dbcheck - naming and semantic checks for EPICS DB files
//!
//! This is the main entry point for the dbcheck CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use dbcheck_core::{CheckConfig, ConfigLoader};
use dbcheck_lint::{CheckReport, Severity, build_failure_message, check_db, group_db};
use dbcheck_parser::{Db, DbSyntaxError, parse};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Dbcheck - lint EPICS DB files for PV naming and record conventions
#[derive(Parser)]
#[command(name = "dbcheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML or JSON check configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and check DB files
    Check {
        /// DB files to check, reported in the order given
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Report every naming problem as an error
        #[arg(long)]
        strict: bool,

        /// Skip the naming checks
        #[arg(long)]
        no_syntax: bool,

        /// Skip the record content checks
        #[arg(long)]
        no_pv: bool,
    },

    /// Print the parsed records and PV groups of a file as JSON
    Dump {
        file: PathBuf,
    },

    /// Show version information
    Version,
}

/// Why a file produced no report
#[derive(Debug, thiserror::Error)]
enum FileError {
    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Syntax(#[from] DbSyntaxError),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CheckConfig::default(),
    };

    init_tracing(cli.verbose, &config.logging.level);

    match cli.command {
        Commands::Check {
            files,
            strict,
            no_syntax,
            no_pv,
        } => {
            let mut config = config;
            config.strict |= strict;
            config.syntax &= !no_syntax;
            config.pv &= !no_pv;

            if !check_files(files, config).await? {
                std::process::exit(1);
            }
        }

        Commands::Dump { file } => {
            let db = read_db(&file)?;
            let groups = group_db(&db);
            let dump = serde_json::json!({ "db": db, "groups": groups });
            println!("{}", serde_json::to_string_pretty(&dump)?);
        }

        Commands::Version => {
            println!("dbcheck v{}", dbcheck_core::VERSION);
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over `--verbose`, which wins over the configured level
fn init_tracing(verbose: bool, configured_level: &str) {
    let level = if verbose { "debug" } else { configured_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_db(path: &Path) -> Result<Db, FileError> {
    let source = std::fs::read_to_string(path)?;
    let db = parse(&source)?;
    Ok(db.with_source(path.display().to_string()))
}

fn check_file(path: &Path, config: &CheckConfig) -> Result<CheckReport, FileError> {
    let db = read_db(path)?;
    tracing::debug!("Parsed {} records from {}", db.len(), path.display());
    Ok(check_db(&db, config))
}

/// Totals across every checked file
#[derive(Default)]
struct Summary {
    checked: usize,
    warnings: usize,
    errors: usize,
    failed: Vec<String>,
}

impl Summary {
    fn add_report(&mut self, path: &Path, report: &CheckReport) {
        println!("Checking {}", path.display());
        for (severity, findings) in [
            (Severity::Warning, &report.warnings),
            (Severity::Error, &report.errors),
        ] {
            if !findings.is_empty() {
                println!("{}", build_failure_message(&severity.to_string(), findings));
            }
        }

        if report.has_errors() {
            println!(
                "❌ {} failed ({} errors, {} warnings)",
                path.display(),
                report.errors.len(),
                report.warnings.len()
            );
        } else {
            println!(
                "✅ {} passed ({} warnings)",
                path.display(),
                report.warnings.len()
            );
        }

        self.checked += 1;
        self.warnings += report.warnings.len();
        self.errors += report.errors.len();
    }

    fn add_failure(&mut self, path: &Path, error: &FileError) {
        tracing::error!("Failed to parse {}: {}", path.display(), error);
        self.failed.push(format!("{}: {}", path.display(), error));
    }

    fn passed(&self) -> bool {
        self.errors == 0 && self.failed.is_empty()
    }

    fn print(&self) {
        println!(
            "{} files checked: {} errors, {} warnings",
            self.checked, self.errors, self.warnings
        );
        if !self.failed.is_empty() {
            println!(
                "{}",
                build_failure_message("Failed to parse the following files", &self.failed)
            );
        }
    }
}

/// Check every file on the blocking pool, then report in argument order.
/// Returns whether every file parsed and passed.
async fn check_files(files: Vec<PathBuf>, config: CheckConfig) -> anyhow::Result<bool> {
    let config = Arc::new(config);
    let handles: Vec<_> = files
        .into_iter()
        .map(|path| {
            let config = Arc::clone(&config);
            tokio::task::spawn_blocking(move || {
                let outcome = check_file(&path, &config);
                (path, outcome)
            })
        })
        .collect();

    let mut summary = Summary::default();
    for handle in handles {
        let (path, outcome) = handle.await.context("check task panicked")?;
        match outcome {
            Ok(report) => summary.add_report(&path, &report),
            Err(e) => summary.add_failure(&path, &e),
        }
    }

    summary.print();
    Ok(summary.passed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_flags_parse() {
        let cli = Cli::try_parse_from(["dbcheck", "check", "--strict", "--no-pv", "a.db", "b.db"])
            .unwrap();
        match cli.command {
            Commands::Check {
                files,
                strict,
                no_syntax,
                no_pv,
            } => {
                assert_eq!(files, vec![PathBuf::from("a.db"), PathBuf::from("b.db")]);
                assert!(strict);
                assert!(!no_syntax);
                assert!(no_pv);
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_check_requires_files() {
        assert!(Cli::try_parse_from(["dbcheck", "check"]).is_err());
    }

    #[test]
    fn test_summary_passes_only_without_errors() {
        let mut summary = Summary::default();
        assert!(summary.passed());
        summary.errors = 1;
        assert!(!summary.passed());
    }
}
