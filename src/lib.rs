//! Core library for the `docshift` CLI.
//!
//! Recovers the persistence model of an annotated Java codebase, asks a
//! language model how to move it to MongoDB, normalizes whatever comes back
//! into a complete plan, and estimates the per-file change impact.
//!
//! The pipeline is [`extract::analyze`] → [`resolve::resolve_relationships`]
//! → [`recommend::request`] → [`plan::normalize`] → [`impact::estimate`].

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod impact;
pub mod model;
pub mod plan;
pub mod ports;
pub mod recommend;
pub mod resolve;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "docshift=warn";

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        // --help and --version
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli.command)
}

/// Installs the stderr log subscriber, filtered by `RUST_LOG`.
///
/// Calling it more than once is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["docshift", "unknown"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_errors_on_missing_root() {
        let result = run(["docshift", "analyze", "/nonexistent/docshift/root"]);
        assert!(result.unwrap_err().contains("not an accessible directory"));
    }
}
