// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! The only subcommand is the runner entry point. It is produced by the
//! launcher, not typed by people; the `--id` flag exists so the encoded
//! task ID lands on the command line where the status tracker can later
//! find it.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for the `bgtask` runner.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bgtask",
    version,
    about = "Runs detached background tasks with a wall-clock time limit.",
    long_about = None
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BGTASK_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Runs a background task from its transport string (DO NOT USE DIRECTLY).
    Run {
        /// Base64 transport string produced by the launcher.
        task: String,

        /// Encoded task ID, kept on the command line for liveness discovery.
        #[arg(long, value_name = "ID")]
        id: Option<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
