//! prom-relabel library
//!
//! This crate provides a Prometheus-style relabeling engine: an ordered
//! list of rules that rewrite, add, remove or drop a metric's labels and
//! name, plus text exposition parsing and formatting around it.

pub mod cli;
pub mod config;
pub mod error;
pub mod exposition;
pub mod relabel;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging subsystem
///
/// Logs go to stderr so that relabeled output on stdout stays clean.
/// `RUST_LOG` takes precedence over `level`.
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
