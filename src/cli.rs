// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tester`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tester",
    version,
    about = "Drive a line-oriented program with a script of input lines and directives.",
    long_about = None
)]
pub struct CliArgs {
    /// Program to supervise (path or command name).
    #[arg(short, long, value_name = "PATH")]
    pub program: String,

    /// Script file to run.
    ///
    /// Default: read the script from standard input.
    #[arg(short, long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Optional TOML file with a `[run]` section.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// How long to wait for child output after each forwarded line.
    #[arg(long, value_name = "MS")]
    pub poll_timeout_ms: Option<u64>,

    /// Kill the child if it has not exited this long after its pipes close.
    ///
    /// If omitted, teardown waits for the child indefinitely.
    #[arg(long, value_name = "MS")]
    pub teardown_timeout_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TESTER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Classify the script and print what would happen, without starting
    /// any process.
    #[arg(long)]
    pub dry_run: bool,

    /// Extra arguments passed to the program on every RESTART.
    #[arg(last = true, value_name = "ARGS")]
    pub program_args: Vec<String>,
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
