//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI parser for `docshift`.
#[derive(Debug, Parser)]
#[command(
    name = "docshift",
    version,
    about = "Recover a relational data model from source and plan its move to MongoDB"
)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Rendering of command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary and tables.
    #[default]
    Text,
    /// YAML document.
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract entities, repositories and configuration from a source tree.
    Analyze {
        /// Root of the source tree.
        path: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
        /// Write output to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build a migration plan and impact report for a source tree.
    Plan {
        /// Root of the source tree.
        path: PathBuf,
        /// Use a saved recommendation text instead of calling the model.
        #[arg(long, conflicts_with = "offline")]
        response: Option<PathBuf>,
        /// Skip the model and plan from deterministic defaults only.
        #[arg(long)]
        offline: bool,
        /// Output format.
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
        /// Write output to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check that a MongoDB deployment is reachable.
    Probe {
        /// Connection string (`mongodb://` or `mongodb+srv://`).
        uri: String,
        /// Seconds to wait for the connection.
        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,
    },
}
