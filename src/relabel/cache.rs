//! Compiled regex cache
//!
//! Patterns are compiled once, keyed by their source text, and shared by
//! every rule that names the same pattern. The cache is populated while an
//! engine is built and only read afterwards.

use regex::Regex;
use std::collections::HashMap;

use crate::error::{RelabelError, RelabelResult};

/// Regex cache keyed by pattern source text
#[derive(Debug, Clone, Default)]
pub struct RegexCache {
    patterns: HashMap<String, Regex>,
}

impl RegexCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a pattern unless it is already cached
    ///
    /// # Errors
    ///
    /// Returns `RelabelError::InvalidPattern` if the pattern is not valid regex.
    pub fn compile(&mut self, pattern: &str) -> RelabelResult<&Regex> {
        if !self.patterns.contains_key(pattern) {
            let regex = Regex::new(pattern).map_err(|e| RelabelError::InvalidPattern {
                pattern: pattern.to_string(),
                source: e,
            })?;
            tracing::debug!(pattern = %pattern, "Compiled relabel regex");
            self.patterns.insert(pattern.to_string(), regex);
        }
        self.get(pattern)
    }

    /// Look up a previously compiled pattern
    ///
    /// # Errors
    ///
    /// Returns `RelabelError::PatternNotCompiled` if `compile` was never
    /// called for this pattern.
    pub fn get(&self, pattern: &str) -> RelabelResult<&Regex> {
        self.patterns
            .get(pattern)
            .ok_or_else(|| RelabelError::PatternNotCompiled {
                pattern: pattern.to_string(),
            })
    }

    /// Check if a pattern has been compiled
    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.contains_key(pattern)
    }

    /// Number of distinct compiled patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
