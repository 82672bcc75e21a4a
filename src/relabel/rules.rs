//! Relabel rule definitions
//!
//! A [`RelabelConfig`] is a rule as it arrives from configuration: every
//! field is plain text, including the action. [`Rule`] is its validated
//! form, produced while an engine is built, with the action resolved to a
//! [`RelabelAction`].
//!
//! # Example Configuration (YAML)
//!
//! ```yaml
//! - source_labels: [__name__]
//!   regex: "(.*)"
//!   target_label: __name__
//!   replacement: "prefix_$1"
//!   action: replace
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::error::RelabelError;

/// Relabel action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelabelAction {
    /// Write a templated value into a templated target label
    Replace,
    /// Drop the metric unless the joined source values match
    Keep,
    /// Drop the metric if the joined source values match
    Drop,
    /// Copy labels whose names match under a templated new name
    LabelMap,
    /// Remove labels whose names match
    LabelDrop,
    /// Remove labels whose names do not match
    LabelKeep,
}

impl RelabelAction {
    /// All supported actions
    pub const ALL: [RelabelAction; 6] = [
        RelabelAction::Replace,
        RelabelAction::Keep,
        RelabelAction::Drop,
        RelabelAction::LabelMap,
        RelabelAction::LabelDrop,
        RelabelAction::LabelKeep,
    ];

    /// Returns the configuration keyword for this action
    pub fn as_str(&self) -> &'static str {
        match self {
            RelabelAction::Replace => "replace",
            RelabelAction::Keep => "keep",
            RelabelAction::Drop => "drop",
            RelabelAction::LabelMap => "labelmap",
            RelabelAction::LabelDrop => "labeldrop",
            RelabelAction::LabelKeep => "labelkeep",
        }
    }
}

impl FromStr for RelabelAction {
    type Err = RelabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(RelabelAction::Replace),
            "keep" => Ok(RelabelAction::Keep),
            "drop" => Ok(RelabelAction::Drop),
            "labelmap" => Ok(RelabelAction::LabelMap),
            "labeldrop" => Ok(RelabelAction::LabelDrop),
            "labelkeep" => Ok(RelabelAction::LabelKeep),
            _ => Err(RelabelError::UnknownAction {
                action: s.to_string(),
            }),
        }
    }
}

impl Serialize for RelabelAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelabelAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for RelabelAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relabel rule as read from configuration
///
/// Unset text fields default to the empty string. The action stays
/// unparsed here so that an unknown action is reported by the engine
/// build together with the index of the offending rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelabelConfig {
    /// Labels whose values are joined to form the matched value
    #[serde(default)]
    pub source_labels: Vec<String>,

    /// Separator placed between source label values
    #[serde(default)]
    pub separator: String,

    /// Regex pattern
    #[serde(default)]
    pub regex: String,

    /// Target label name template (replace only)
    #[serde(default)]
    pub target_label: String,

    /// Replacement template
    ///
    /// Supports `$1`, `${1}`, `$name` and `${name}` capture references.
    #[serde(default)]
    pub replacement: String,

    /// Action keyword
    #[serde(default)]
    pub action: String,
}

impl RelabelConfig {
    /// Create a config for the given action keyword
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    /// Set the source labels
    pub fn source_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the separator
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the regex pattern
    pub fn regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = regex.into();
        self
    }

    /// Set the target label template
    pub fn target_label(mut self, target_label: impl Into<String>) -> Self {
        self.target_label = target_label.into();
        self
    }

    /// Set the replacement template
    pub fn replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }
}

/// Validated, immutable relabel rule
///
/// The rule keeps only the source text of its regex; the compiled form is
/// owned by the engine's regex cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Labels whose values are joined to form the matched value
    pub source_labels: Vec<String>,
    /// Separator placed between source label values
    pub separator: String,
    /// Regex pattern source text, compiled by the engine's cache
    pub regex: String,
    /// Target label name template (replace only)
    pub target_label: String,
    /// Replacement template
    pub replacement: String,
    /// Resolved action
    pub action: RelabelAction,
}

impl TryFrom<RelabelConfig> for Rule {
    type Error = RelabelError;

    fn try_from(config: RelabelConfig) -> Result<Self, Self::Error> {
        let action = config.action.parse()?;
        Ok(Self {
            source_labels: config.source_labels,
            separator: config.separator,
            regex: config.regex,
            target_label: config.target_label,
            replacement: config.replacement,
            action,
        })
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "action={} source_labels=[{}] separator={:?} regex={:?} target_label={:?} replacement={:?}",
            self.action,
            self.source_labels.join(", "),
            self.separator,
            self.regex,
            self.target_label,
            self.replacement
        )
    }
}
