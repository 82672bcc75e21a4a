//! CLI argument parsing for prom-relabel
//!
//! # Options
//!
//! - `--config` / `-c`: Relabel rules file (default: relabel.yaml, env: PROM_RELABEL_CONFIG)
//! - `--input` / `-i`: Exposition text to relabel (default: stdin)
//! - `--validate`: Validate the rules without relabeling anything
//! - `--dry-run`: Show the parsed rules
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: PROM_RELABEL_LOG_LEVEL)
//! - `--output-format`: Output format for validate/dry-run (text/json/yaml)
//! - `--no-timestamps`: Omit sample timestamps from the output

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// prom-relabel - Prometheus-style metric relabeling
///
/// Reads metrics in the Prometheus text exposition format, applies the
/// configured relabel rules in order and prints the metrics that survive.
#[derive(Parser, Debug)]
#[command(name = "prom-relabel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to relabel rules file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "relabel.yaml",
        env = "PROM_RELABEL_CONFIG"
    )]
    pub config: PathBuf,

    /// Exposition text to relabel (reads stdin when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Validate the rules without relabeling anything
    #[arg(long)]
    pub validate: bool,

    /// Show the parsed rules
    #[arg(long)]
    pub dry_run: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "warn",
        env = "PROM_RELABEL_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Output format for --validate and --dry-run
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Omit sample timestamps from the output
    #[arg(long)]
    pub no_timestamps: bool,
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warn level - default
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Output format options for validate and dry-run modes
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}
