//! Prometheus Exposition Format output
//!
//! Formats relabeled samples back into the text exposition format
//! (version 0.0.4).
//!
//! ```text
//! # HELP <metric_name> <help_text>
//! # TYPE <metric_name> <type>
//! <metric_name>{<label1>="<value1>",<label2>="<value2>"} <value> [<timestamp>]
//! ```

use std::collections::HashMap;

use crate::relabel::{Metric, MetricType};

/// Prometheus exposition format formatter
///
/// # Example
///
/// ```ignore
/// use prom_relabel::exposition::PrometheusFormatter;
/// use prom_relabel::relabel::{Metric, MetricType};
///
/// let metrics = vec![Metric::new("up", 1.0).with_type(MetricType::Gauge)];
/// let output = PrometheusFormatter::new().format(&metrics);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrometheusFormatter {
    /// Include timestamp in output
    include_timestamp: bool,
}

impl PrometheusFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to include timestamps in output
    pub fn with_timestamps(mut self, include: bool) -> Self {
        self.include_timestamp = include;
        self
    }

    /// Format metrics into Prometheus exposition format
    ///
    /// - Samples are grouped by name, groups in order of first occurrence
    /// - HELP is emitted once per name when the first sample carries help text
    /// - TYPE is emitted once per name unless the first sample is untyped
    /// - Labels are sorted alphabetically
    pub fn format(&self, metrics: &[Metric]) -> String {
        if metrics.is_empty() {
            return String::new();
        }

        let mut output = String::with_capacity(metrics.len() * 64);

        for (name, group) in Self::group_by_name(metrics) {
            let first = group[0];
            if let Some(help) = &first.help {
                output.push_str(&format!("# HELP {} {}\n", name, Self::escape_help(help)));
            }
            if first.metric_type != MetricType::Untyped {
                output.push_str(&format!("# TYPE {} {}\n", name, first.metric_type));
            }

            for metric in group {
                output.push_str(&self.format_sample_line(metric));
                output.push('\n');
            }
        }

        output
    }

    /// Group metrics by name, preserving order of first occurrence
    fn group_by_name(metrics: &[Metric]) -> Vec<(&str, Vec<&Metric>)> {
        let mut groups: HashMap<&str, Vec<&Metric>> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for metric in metrics {
            let name = metric.name.as_str();
            groups
                .entry(name)
                .or_insert_with(|| {
                    order.push(name);
                    Vec::new()
                })
                .push(metric);
        }

        order
            .into_iter()
            .filter_map(|name| groups.remove(name).map(|g| (name, g)))
            .collect()
    }

    fn format_sample_line(&self, metric: &Metric) -> String {
        let mut line = metric.name.clone();

        if !metric.labels.is_empty() {
            let mut sorted_labels: Vec<(&String, &String)> = metric.labels.iter().collect();
            sorted_labels.sort_by_key(|(k, _)| *k);

            let label_pairs: Vec<String> = sorted_labels
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, Self::escape_label_value(v)))
                .collect();

            line.push('{');
            line.push_str(&label_pairs.join(","));
            line.push('}');
        }

        line.push(' ');
        line.push_str(&Self::format_value(metric.value));

        if self.include_timestamp {
            if let Some(ts) = metric.timestamp {
                line.push(' ');
                line.push_str(&ts.to_string());
            }
        }

        line
    }

    /// Format a sample value
    ///
    /// - NaN → "NaN"
    /// - ±Inf → "+Inf" / "-Inf"
    /// - Whole numbers below 1e15 → no decimal point
    /// - Everything else → shortest round-trip float representation
    fn format_value(value: f64) -> String {
        if value.is_nan() {
            "NaN".to_string()
        } else if value.is_infinite() {
            if value.is_sign_positive() {
                "+Inf".to_string()
            } else {
                "-Inf".to_string()
            }
        } else if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            format!("{}", value)
        }
    }

    /// Escapes backslash and newline characters.
    fn escape_help(help: &str) -> String {
        help.replace('\\', "\\\\").replace('\n', "\\n")
    }

    /// Escapes backslash, double-quote, and newline characters.
    fn escape_label_value(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                '\n' => escaped.push_str("\\n"),
                _ => escaped.push(c),
            }
        }
        escaped
    }
}
