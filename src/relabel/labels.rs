//! Label set used during rule evaluation
//!
//! While rules run, the metric name lives in the set under the synthetic
//! [`METRIC_NAME_LABEL`] key so rules can match and rewrite it like any
//! other label. [`LabelSet::into_parts`] takes it back out.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Synthetic label carrying the metric name during evaluation
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Check a label name against `[a-zA-Z_][a-zA-Z0-9_]*`
pub fn is_valid_label_name(name: &str) -> bool {
    static LABEL_NAME_RE: OnceLock<Regex> = OnceLock::new();
    let re = LABEL_NAME_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("invalid label name regex")
    });
    re.is_match(name)
}

/// Mutable label mapping for one metric
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: HashMap<String, String>,
}

impl LabelSet {
    /// Create an empty label set
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a label set from a metric's labels plus its name
    ///
    /// A `__name__` entry already present in `labels` is overwritten by
    /// `name`.
    pub fn with_metric_name(name: &str, mut labels: HashMap<String, String>) -> Self {
        labels.insert(METRIC_NAME_LABEL.to_string(), name.to_string());
        Self { labels }
    }

    /// Value of a label, or the empty string when absent
    pub fn value(&self, name: &str) -> &str {
        self.labels.get(name).map(String::as_str).unwrap_or("")
    }

    /// Value of a label if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    /// Join the values of `names` with `separator`
    ///
    /// Missing labels contribute an empty string.
    pub fn join_values(&self, names: &[String], separator: &str) -> String {
        names
            .iter()
            .map(|name| self.value(name))
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Set a label, overwriting any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.labels.insert(name.into(), value.into());
    }

    /// Remove a label, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.labels.remove(name)
    }

    /// Keep only the labels whose name satisfies `keep`
    pub fn retain_names<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.labels.retain(|name, _| keep(name));
    }

    /// Read-only copy of the current labels
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.labels.clone()
    }

    /// Check if a label is present
    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Number of labels, including the synthetic name label if present
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate over all labels
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Split into the metric name (if still present) and the remaining labels
    pub fn into_parts(mut self) -> (Option<String>, HashMap<String, String>) {
        let name = self.labels.remove(METRIC_NAME_LABEL);
        (name, self.labels)
    }
}

impl From<HashMap<String, String>> for LabelSet {
    fn from(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }
}
