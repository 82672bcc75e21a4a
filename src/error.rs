//! Error types for prom-relabel
//!
//! This module defines the error types used throughout the library.
//! Configuration errors are raised while an engine is being built;
//! per-metric evaluation never fails for rules owned by a built engine.

use thiserror::Error;

/// Relabel rule configuration errors
#[derive(Error, Debug)]
pub enum RelabelError {
    /// Regex pattern failed to compile
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Action is not one of the supported relabel actions
    #[error(
        "Unknown relabel action '{action}', expected one of: \
         replace, keep, drop, labelmap, labeldrop, labelkeep"
    )]
    UnknownAction { action: String },

    /// Pattern was looked up before it was compiled into the cache
    #[error("Regex pattern '{pattern}' has not been compiled")]
    PatternNotCompiled { pattern: String },

    /// Rule compilation failed (with rule index)
    #[error("Failed to compile relabel rule at index {index}: {source}")]
    RuleCompileFailed {
        index: usize,
        #[source]
        source: Box<RelabelError>,
    },
}

impl RelabelError {
    /// Wrap an error with the index of the rule that produced it
    pub fn at_rule(self, index: usize) -> Self {
        RelabelError::RuleCompileFailed {
            index,
            source: Box::new(self),
        }
    }
}

/// Exposition format parse errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Sample line without a value
    #[error("line {line}: missing sample value")]
    MissingValue { line: usize },

    /// Sample value is not a float
    #[error("line {line}: invalid sample value '{value}'")]
    InvalidValue { line: usize, value: String },

    /// Timestamp is not an integer
    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp { line: usize, value: String },

    /// Label block is malformed
    #[error("line {line}: malformed labels: {reason}")]
    MalformedLabels { line: usize, reason: String },

    /// Unexpected tokens after the timestamp
    #[error("line {line}: unexpected trailing content '{content}'")]
    TrailingContent { line: usize, content: String },
}

/// Result type alias for relabel operations
pub type RelabelResult<T> = Result<T, RelabelError>;
