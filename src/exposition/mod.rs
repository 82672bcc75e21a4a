//! Prometheus text exposition support
//!
//! Reads samples for relabeling and writes the surviving samples back out.

pub mod formatter;
pub mod parser;

pub use formatter::PrometheusFormatter;
pub use parser::{parse_exposition, ParseResult};
