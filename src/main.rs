//! Binary entry point for reachme.
//!
//! This binary provides the CLI interface for the reachme page editor.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use reachme::cli::{self, Cli};
use reachme::config::ReachmeConfig;
use reachme::observability::{self, LoggingConfig};
use std::process::ExitCode;

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::new(config.log_format, config.log_filter.as_deref(), cli.verbose);
    if let Err(e) = observability::init(logging) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match cli::run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Loads configuration: file, then environment, then command-line flags.
fn load_config(cli: &Cli) -> reachme::Result<ReachmeConfig> {
    let config = match cli.config.as_deref() {
        Some(path) => ReachmeConfig::load_from_file(path)?,
        None => ReachmeConfig::load_default(),
    };
    let config = config.with_env_overrides();
    Ok(match cli.api_url.as_deref() {
        Some(url) => config.with_api_url(url),
        None => config,
    })
}
