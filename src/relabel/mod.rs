//! Metric relabeling module
//!
//! This module applies Prometheus-style relabel rules to a metric's
//! name and labels: rewriting, copying and removing labels, or dropping
//! the metric entirely.

pub mod cache;
pub mod engine;
pub mod labels;
pub mod metric;
pub mod rules;

pub use cache::RegexCache;
pub use engine::{RelabelEngine, Relabeled, RuleOutcome};
pub use labels::{is_valid_label_name, LabelSet, METRIC_NAME_LABEL};
pub use metric::{Metric, MetricType, RelabelTarget};
pub use rules::{RelabelAction, RelabelConfig, Rule};
