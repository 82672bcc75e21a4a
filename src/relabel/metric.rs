//! Metric types seen by the relabel engine
//!
//! The engine works on anything implementing [`RelabelTarget`]: a metric
//! that exposes its name and a mutable label mapping. [`Metric`] is the
//! concrete sample type produced by the exposition parser.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// Metric as seen by the relabel pipeline
///
/// Implementors hand their labels to the engine and receive the rewritten
/// name and labels back when the metric survives relabeling.
pub trait RelabelTarget {
    /// Current metric name
    fn name(&self) -> &str;

    /// Replace the metric name
    fn set_name(&mut self, name: String);

    /// Mutable access to the metric's labels
    fn labels_mut(&mut self) -> &mut HashMap<String, String>;
}

/// Prometheus metric type
///
/// The default type is `Untyped` when no `# TYPE` line was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricType {
    /// Gauge metric - a value that can go up and down
    Gauge,
    /// Counter metric - a monotonically increasing value
    Counter,
    /// Histogram metric - observations counted in buckets
    Histogram,
    /// Summary metric - client-side quantiles
    Summary,
    /// Untyped metric - type is not specified
    #[default]
    Untyped,
}

impl MetricType {
    /// Returns the Prometheus type string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
            MetricType::Histogram => "histogram",
            MetricType::Summary => "summary",
            MetricType::Untyped => "untyped",
        }
    }

    /// Parse a `# TYPE` keyword, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gauge" => Some(MetricType::Gauge),
            "counter" => Some(MetricType::Counter),
            "histogram" => Some(MetricType::Histogram),
            "summary" => Some(MetricType::Summary),
            "untyped" | "unknown" => Some(MetricType::Untyped),
            _ => None,
        }
    }
}

impl Serialize for MetricType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MetricType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MetricType::parse(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown metric type '{}', expected one of: gauge, counter, histogram, summary, untyped",
                s
            ))
        })
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single metric sample
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Metric name
    pub name: String,
    /// Labels
    pub labels: HashMap<String, String>,
    /// Sample value
    pub value: f64,
    /// Optional timestamp (milliseconds since epoch)
    pub timestamp: Option<i64>,
    /// Metric type from the `# TYPE` line
    pub metric_type: MetricType,
    /// Help text from the `# HELP` line
    pub help: Option<String>,
}

impl Metric {
    /// Create a new untyped metric without labels
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            labels: HashMap::new(),
            value,
            timestamp: None,
            metric_type: MetricType::Untyped,
            help: None,
        }
    }

    /// Set the metric type
    pub fn with_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = metric_type;
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Set timestamp
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl RelabelTarget for Metric {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn labels_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.labels
    }
}

impl<T: RelabelTarget + ?Sized> RelabelTarget for &mut T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn set_name(&mut self, name: String) {
        (**self).set_name(name)
    }

    fn labels_mut(&mut self) -> &mut HashMap<String, String> {
        (**self).labels_mut()
    }
}
