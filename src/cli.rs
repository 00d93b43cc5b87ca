// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `odo-watch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "odo-watch",
    version,
    about = "Watch component sources and push changes to a dev workload.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "odo-watch.toml")]
    pub config: String,

    /// Override `[component].path`.
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Override `[watch].delay`, e.g. "500ms" or "0s".
    #[arg(long, value_name = "DURATION")]
    pub delay: Option<String>,

    /// Extra ignore glob; may be repeated.
    #[arg(long = "ignore", value_name = "GLOB")]
    pub ignores: Vec<String>,

    /// Do not watch the source tree; only cluster events and keys trigger
    /// pushes.
    #[arg(long)]
    pub no_watch: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ODO_WATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate and print the effective settings, then exit.
    #[arg(long)]
    pub dry_run: bool,
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
