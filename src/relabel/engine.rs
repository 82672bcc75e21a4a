//! Relabel Engine - ordered rule evaluation over a metric's labels
//!
//! An engine is built once from a list of [`RelabelConfig`]s. Building
//! validates every action and compiles every regex into the engine's own
//! [`RegexCache`]; after that the engine is read-only and can be shared
//! across threads to evaluate metrics concurrently.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::RelabelResult;

use super::cache::RegexCache;
use super::labels::{is_valid_label_name, LabelSet};
use super::metric::RelabelTarget;
use super::rules::{RelabelAction, RelabelConfig, Rule};

/// Result of applying a single rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Continue with the next rule
    Continue,
    /// Discard the whole metric
    Drop,
}

/// Result of relabeling a metric
#[derive(Debug, Clone, PartialEq)]
pub enum Relabeled<M> {
    /// The metric survived, with its rewritten name and labels
    Kept(M),
    /// A `keep` or `drop` rule discarded the metric
    Dropped,
}

impl<M> Relabeled<M> {
    /// Check if the metric was dropped
    pub fn is_dropped(&self) -> bool {
        matches!(self, Relabeled::Dropped)
    }

    /// The surviving metric, if any
    pub fn kept(self) -> Option<M> {
        match self {
            Relabeled::Kept(metric) => Some(metric),
            Relabeled::Dropped => None,
        }
    }
}

/// Relabel engine holding validated rules and their compiled patterns
#[derive(Debug, Clone, Default)]
pub struct RelabelEngine {
    rules: Vec<Rule>,
    cache: RegexCache,
}

impl RelabelEngine {
    /// Build an engine from rule configurations
    ///
    /// Every action is validated and every distinct pattern compiled here,
    /// before any metric is evaluated.
    ///
    /// # Errors
    ///
    /// Returns `RelabelError::RuleCompileFailed` wrapping either
    /// `UnknownAction` or `InvalidPattern` for the first offending rule.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use prom_relabel::relabel::{RelabelConfig, RelabelEngine};
    ///
    /// let engine = RelabelEngine::build(vec![
    ///     RelabelConfig::new("labeldrop").regex("^temp_.*"),
    /// ])?;
    /// ```
    pub fn build<I>(configs: I) -> RelabelResult<Self>
    where
        I: IntoIterator<Item = RelabelConfig>,
    {
        let mut rules = Vec::new();
        let mut cache = RegexCache::new();

        for (index, config) in configs.into_iter().enumerate() {
            let rule = Rule::try_from(config).map_err(|e| e.at_rule(index))?;
            cache.compile(&rule.regex).map_err(|e| e.at_rule(index))?;
            rules.push(rule);
        }

        tracing::info!(
            rules = rules.len(),
            patterns = cache.len(),
            "Relabel engine built"
        );

        Ok(Self { rules, cache })
    }

    /// Get the rules in evaluation order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Get the compiled pattern cache
    pub fn cache(&self) -> &RegexCache {
        &self.cache
    }

    /// Get the number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the engine has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Relabel a metric
    ///
    /// The metric name is exposed to the rules as `__name__`. If that label
    /// still exists after the last rule, its value becomes the new metric
    /// name; if a rule removed it, the metric keeps its original name. The
    /// `__name__` label never appears in the returned labels.
    ///
    /// The metric is only written to once every rule has run, so on error
    /// a metric passed by `&mut` is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Only fails if a rule's pattern is missing from the cache, which
    /// cannot happen for rules owned by a built engine.
    pub fn relabel<M: RelabelTarget>(&self, mut metric: M) -> RelabelResult<Relabeled<M>> {
        let labels = metric.labels_mut().clone();
        let mut labels = LabelSet::with_metric_name(metric.name(), labels);

        for (index, rule) in self.rules.iter().enumerate() {
            if self.apply_rule(&mut labels, rule)? == RuleOutcome::Drop {
                tracing::trace!(
                    metric = %metric.name(),
                    rule = index,
                    action = %rule.action,
                    "Metric dropped by relabel rule"
                );
                return Ok(Relabeled::Dropped);
            }
        }

        let (name, labels) = labels.into_parts();
        if let Some(name) = name {
            metric.set_name(name);
        }
        *metric.labels_mut() = labels;

        Ok(Relabeled::Kept(metric))
    }

    /// Apply one rule to a label set
    ///
    /// # Errors
    ///
    /// Returns `RelabelError::PatternNotCompiled` if the rule's pattern is
    /// not in this engine's cache.
    pub fn apply_rule(&self, labels: &mut LabelSet, rule: &Rule) -> RelabelResult<RuleOutcome> {
        let regex = self.cache.get(&rule.regex)?;

        match rule.action {
            RelabelAction::Drop => {
                let value = labels.join_values(&rule.source_labels, &rule.separator);
                if regex.is_match(&value) {
                    return Ok(RuleOutcome::Drop);
                }
            }
            RelabelAction::Keep => {
                let value = labels.join_values(&rule.source_labels, &rule.separator);
                if !regex.is_match(&value) {
                    return Ok(RuleOutcome::Drop);
                }
            }
            RelabelAction::LabelDrop => labels.retain_names(|name| !regex.is_match(name)),
            RelabelAction::LabelKeep => labels.retain_names(|name| regex.is_match(name)),
            RelabelAction::Replace => {
                let value = labels.join_values(&rule.source_labels, &rule.separator);
                replace(labels, rule, regex, &value);
            }
            RelabelAction::LabelMap => label_map(labels, rule, regex),
        }

        Ok(RuleOutcome::Continue)
    }
}

/// Write the expanded replacement under the expanded target label
fn replace(labels: &mut LabelSet, rule: &Rule, regex: &Regex, value: &str) {
    let Some(captures) = regex.captures(value) else {
        return;
    };

    let mut target = String::new();
    captures.expand(&rule.target_label, &mut target);
    if !is_valid_label_name(&target) {
        labels.remove(&rule.target_label);
        return;
    }

    let mut replacement = String::new();
    captures.expand(&rule.replacement, &mut replacement);
    if replacement.is_empty() {
        labels.remove(&target);
        return;
    }

    labels.set(target, replacement);
}

/// Copy matching labels under new names
///
/// The new name is the label name with every match of the pattern replaced
/// by the expanded replacement; unmatched parts of the name are kept. Names
/// are matched against a snapshot taken before the rule runs, so labels
/// added here are never matched again. Snapshot names are visited in sorted
/// order; when two of them map to the same new name, the later one wins.
fn label_map(labels: &mut LabelSet, rule: &Rule, regex: &Regex) {
    let snapshot: BTreeMap<String, String> = labels.snapshot().into_iter().collect();

    for (name, value) in snapshot {
        if regex.is_match(&name) {
            let new_name = regex.replace_all(&name, rule.replacement.as_str());
            labels.set(new_name.into_owned(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelabelError;
    use crate::relabel::labels::METRIC_NAME_LABEL;
    use crate::relabel::metric::Metric;
    use std::collections::HashMap;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn engine(configs: Vec<RelabelConfig>) -> RelabelEngine {
        RelabelEngine::build(configs).unwrap()
    }

    fn apply(config: RelabelConfig, set: &mut LabelSet) -> RuleOutcome {
        let engine = engine(vec![config]);
        engine.apply_rule(set, &engine.rules()[0]).unwrap()
    }

    // ==========================================================================
    // Build tests
    // ==========================================================================

    #[test]
    fn test_build_compiles_each_pattern_once() {
        let engine = engine(vec![
            RelabelConfig::new("drop").regex("a"),
            RelabelConfig::new("keep").regex("a"),
            RelabelConfig::new("labeldrop").regex("b"),
        ]);
        assert_eq!(engine.len(), 3);
        assert_eq!(engine.cache().len(), 2);
        assert!(engine.cache().contains("a"));
        assert!(engine.cache().contains("b"));
    }

    #[test]
    fn test_build_rejects_unknown_action() {
        let err = RelabelEngine::build(vec![
            RelabelConfig::new("keep").regex(".*"),
            RelabelConfig::new("hashmod").regex(".*"),
        ])
        .unwrap_err();

        match err {
            RelabelError::RuleCompileFailed { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, RelabelError::UnknownAction { .. }));
            }
            other => panic!("Expected RuleCompileFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_build_rejects_invalid_regex() {
        let err = RelabelEngine::build(vec![RelabelConfig::new("drop").regex("test[")])
            .unwrap_err();

        match err {
            RelabelError::RuleCompileFailed { index, source } => {
                assert_eq!(index, 0);
                assert!(matches!(*source, RelabelError::InvalidPattern { .. }));
            }
            other => panic!("Expected RuleCompileFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_build_rejects_missing_action() {
        assert!(RelabelEngine::build(vec![RelabelConfig::default()]).is_err());
    }

    #[test]
    fn test_apply_rule_with_foreign_pattern() {
        let engine = RelabelEngine::default();
        let rule = Rule::try_from(RelabelConfig::new("drop").regex("never-compiled")).unwrap();
        let mut set = LabelSet::new();

        let err = engine.apply_rule(&mut set, &rule).unwrap_err();
        assert!(matches!(err, RelabelError::PatternNotCompiled { .. }));
    }

    // ==========================================================================
    // keep / drop tests
    // ==========================================================================

    #[test]
    fn test_drop_on_match() {
        let mut set = LabelSet::from(labels(&[("env", "dev")]));
        let outcome = apply(
            RelabelConfig::new("drop").source_labels(["env"]).regex("dev"),
            &mut set,
        );
        assert_eq!(outcome, RuleOutcome::Drop);
    }

    #[test]
    fn test_drop_passes_through_on_mismatch() {
        let mut set = LabelSet::from(labels(&[("env", "prod")]));
        let before = set.clone();
        let outcome = apply(
            RelabelConfig::new("drop").source_labels(["env"]).regex("^dev$"),
            &mut set,
        );
        assert_eq!(outcome, RuleOutcome::Continue);
        assert_eq!(set, before);
    }

    #[test]
    fn test_drop_regex_is_unanchored() {
        let mut set = LabelSet::from(labels(&[("env", "predev1")]));
        let outcome = apply(
            RelabelConfig::new("drop").source_labels(["env"]).regex("dev"),
            &mut set,
        );
        assert_eq!(outcome, RuleOutcome::Drop);
    }

    #[test]
    fn test_keep_on_mismatch_drops() {
        let mut set = LabelSet::from(labels(&[("host", "server2")]));
        let outcome = apply(
            RelabelConfig::new("keep")
                .source_labels(["host"])
                .regex("^server1$"),
            &mut set,
        );
        assert_eq!(outcome, RuleOutcome::Drop);
    }

    #[test]
    fn test_keep_joins_sources_with_separator() {
        let mut set = LabelSet::from(labels(&[("a", "x"), ("b", "y")]));
        let outcome = apply(
            RelabelConfig::new("keep")
                .source_labels(["a", "missing", "b"])
                .separator(";")
                .regex("^x;;y$"),
            &mut set,
        );
        assert_eq!(outcome, RuleOutcome::Continue);
    }

    // ==========================================================================
    // labeldrop / labelkeep tests
    // ==========================================================================

    #[test]
    fn test_labeldrop_removes_matching_names() {
        let mut set = LabelSet::from(labels(&[("temp_a", "1"), ("host", "x")]));
        apply(RelabelConfig::new("labeldrop").regex("^temp_.*"), &mut set);
        assert_eq!(set, LabelSet::from(labels(&[("host", "x")])));
    }

    #[test]
    fn test_labeldrop_can_remove_name_label() {
        let mut set = LabelSet::with_metric_name("up", labels(&[("job", "node")]));
        apply(RelabelConfig::new("labeldrop").regex("^__.*"), &mut set);
        assert!(!set.contains(METRIC_NAME_LABEL));
        assert!(set.contains("job"));
    }

    #[test]
    fn test_labelkeep_removes_non_matching_names() {
        let mut set = LabelSet::with_metric_name("up", labels(&[("job", "node"), ("zone", "a")]));
        apply(RelabelConfig::new("labelkeep").regex("^(job|__name__)$"), &mut set);
        assert_eq!(set.len(), 2);
        assert!(set.contains("job"));
        assert!(set.contains(METRIC_NAME_LABEL));
    }

    // ==========================================================================
    // replace tests
    // ==========================================================================

    #[test]
    fn test_replace_sets_target() {
        let mut set = LabelSet::from(labels(&[("instance", "host1:9100")]));
        apply(
            RelabelConfig::new("replace")
                .source_labels(["instance"])
                .regex("(.*):(\\d+)")
                .target_label("host")
                .replacement("$1"),
            &mut set,
        );
        assert_eq!(set.get("host"), Some("host1"));
        assert_eq!(set.get("instance"), Some("host1:9100"));
    }

    #[test]
    fn test_replace_overwrites_existing() {
        let mut set = LabelSet::from(labels(&[("env", "dev"), ("stage", "old")]));
        apply(
            RelabelConfig::new("replace")
                .source_labels(["env"])
                .regex("(.+)")
                .target_label("stage")
                .replacement("${1}_env"),
            &mut set,
        );
        assert_eq!(set.get("stage"), Some("dev_env"));
    }

    #[test]
    fn test_replace_templated_target_label() {
        let mut set = LabelSet::from(labels(&[("kv", "zone=us1")]));
        apply(
            RelabelConfig::new("replace")
                .source_labels(["kv"])
                .regex("(?P<key>\\w+)=(?P<val>\\w+)")
                .target_label("$key")
                .replacement("$val"),
            &mut set,
        );
        assert_eq!(set.get("zone"), Some("us1"));
    }

    #[test]
    fn test_replace_no_match_leaves_labels() {
        let mut set = LabelSet::from(labels(&[("y", "keepme")]));
        let before = set.clone();
        apply(
            RelabelConfig::new("replace")
                .source_labels(["x"])
                .regex("(nomatch)")
                .target_label("y")
                .replacement("$1"),
            &mut set,
        );
        assert_eq!(set, before);
    }

    #[test]
    fn test_replace_invalid_target_deletes_literal_target() {
        let mut set = LabelSet::from(labels(&[("src", "bad-name"), ("$1", "literal")]));
        apply(
            RelabelConfig::new("replace")
                .source_labels(["src"])
                .regex("(.*)")
                .target_label("$1")
                .replacement("value"),
            &mut set,
        );
        assert!(!set.contains("$1"));
        assert!(!set.contains("bad-name"));
        assert_eq!(set.get("src"), Some("bad-name"));
    }

    #[test]
    fn test_replace_empty_value_deletes_target() {
        let mut set = LabelSet::from(labels(&[("src", ""), ("dst", "old")]));
        apply(
            RelabelConfig::new("replace")
                .source_labels(["src"])
                .regex("(.*)")
                .target_label("dst")
                .replacement("$1"),
            &mut set,
        );
        assert!(!set.contains("dst"));
    }

    #[test]
    fn test_replace_missing_group_expands_empty() {
        let mut set = LabelSet::from(labels(&[("src", "abc")]));
        apply(
            RelabelConfig::new("replace")
                .source_labels(["src"])
                .regex("(abc)")
                .target_label("dst")
                .replacement("v$2$1"),
            &mut set,
        );
        assert_eq!(set.get("dst"), Some("vabc"));
    }

    #[test]
    fn test_replace_dollar_escape() {
        let mut set = LabelSet::from(labels(&[("src", "5")]));
        apply(
            RelabelConfig::new("replace")
                .source_labels(["src"])
                .regex("(\\d)")
                .target_label("price")
                .replacement("$$$1"),
            &mut set,
        );
        assert_eq!(set.get("price"), Some("$5"));
    }

    // ==========================================================================
    // labelmap tests
    // ==========================================================================

    #[test]
    fn test_labelmap_copies_matching() {
        let mut set = LabelSet::from(labels(&[("label_a", "v"), ("other", "o")]));
        apply(
            RelabelConfig::new("labelmap")
                .regex("^label_(.*)")
                .replacement("$1"),
            &mut set,
        );
        assert_eq!(
            set,
            LabelSet::from(labels(&[("label_a", "v"), ("a", "v"), ("other", "o")]))
        );
    }

    #[test]
    fn test_labelmap_does_not_rematch_new_names() {
        // "x" -> "xx" would keep growing if new names were matched again
        let mut set = LabelSet::from(labels(&[("x", "1")]));
        apply(
            RelabelConfig::new("labelmap").regex("^(x+)$").replacement("${1}x"),
            &mut set,
        );
        assert_eq!(set, LabelSet::from(labels(&[("x", "1"), ("xx", "1")])));
    }

    #[test]
    fn test_labelmap_overwrites_existing_target() {
        let mut set = LabelSet::from(labels(&[("meta_team", "infra"), ("team", "old")]));
        apply(
            RelabelConfig::new("labelmap").regex("^meta_(.*)").replacement("$1"),
            &mut set,
        );
        assert_eq!(set.get("team"), Some("infra"));
        assert_eq!(set.get("meta_team"), Some("infra"));
    }

    #[test]
    fn test_labelmap_rewrites_only_matched_part() {
        let mut set = LabelSet::from(labels(&[("my_label_a", "v")]));
        apply(
            RelabelConfig::new("labelmap").regex("label_(.*)").replacement("$1"),
            &mut set,
        );
        assert_eq!(set, LabelSet::from(labels(&[("my_label_a", "v"), ("my_a", "v")])));
        assert!(!set.contains("a"));
    }

    #[test]
    fn test_labelmap_replaces_every_match() {
        let mut set = LabelSet::from(labels(&[("a_b_c", "v")]));
        apply(
            RelabelConfig::new("labelmap").regex("_").replacement("__"),
            &mut set,
        );
        assert_eq!(set.get("a__b__c"), Some("v"));
        assert_eq!(set.get("a_b_c"), Some("v"));
    }

    #[test]
    fn test_labelmap_collision_later_name_wins() {
        let mut set = LabelSet::from(labels(&[("a_x", "1"), ("b_x", "2")]));
        apply(
            RelabelConfig::new("labelmap").regex("^[ab]_(x)$").replacement("$1"),
            &mut set,
        );
        assert_eq!(set.get("x"), Some("2"));
        assert_eq!(set.len(), 3);
    }

    // ==========================================================================
    // relabel tests
    // ==========================================================================

    #[test]
    fn test_relabel_empty_engine_is_identity() {
        let engine = RelabelEngine::build(Vec::new()).unwrap();
        let metric = Metric::new("up", 1.0).with_label("job", "node");

        let out = engine.relabel(metric.clone()).unwrap().kept().unwrap();
        assert_eq!(out, metric);
        assert!(!out.labels.contains_key(METRIC_NAME_LABEL));
    }

    #[test]
    fn test_relabel_renames_metric() {
        let engine = engine(vec![RelabelConfig::new("replace")
            .source_labels(["__name__"])
            .regex("(.*)")
            .target_label("__name__")
            .replacement("prefix_$1")]);

        let out = engine
            .relabel(Metric::new("cpu_usage", 0.5))
            .unwrap()
            .kept()
            .unwrap();
        assert_eq!(out.name, "prefix_cpu_usage");
        assert!(out.labels.is_empty());
    }

    #[test]
    fn test_relabel_stops_at_drop() {
        let engine = engine(vec![
            RelabelConfig::new("drop").source_labels(["__name__"]).regex("^go_"),
            RelabelConfig::new("replace")
                .regex("(.*)")
                .target_label("never")
                .replacement("set"),
        ]);

        assert!(engine
            .relabel(Metric::new("go_goroutines", 10.0))
            .unwrap()
            .is_dropped());

        let out = engine
            .relabel(Metric::new("up", 1.0))
            .unwrap()
            .kept()
            .unwrap();
        assert_eq!(out.labels.get("never"), Some(&"set".to_string()));
    }

    #[test]
    fn test_relabel_drop_is_not_empty_labels() {
        let engine = engine(vec![RelabelConfig::new("labelkeep").regex("^$")]);
        let result = engine
            .relabel(Metric::new("up", 1.0).with_label("job", "node"))
            .unwrap();

        assert!(!result.is_dropped());
        let out = result.kept().unwrap();
        assert!(out.labels.is_empty());
        assert_eq!(out.name, "up");
    }

    #[test]
    fn test_relabel_preserves_value_and_metadata() {
        let engine = engine(vec![RelabelConfig::new("labeldrop").regex("^tmp$")]);
        let metric = Metric::new("requests_total", 12.5)
            .with_label("tmp", "x")
            .with_timestamp(1000)
            .with_help("Requests");

        let out = engine.relabel(metric).unwrap().kept().unwrap();
        assert_eq!(out.value, 12.5);
        assert_eq!(out.timestamp, Some(1000));
        assert_eq!(out.help.as_deref(), Some("Requests"));
        assert!(out.labels.is_empty());
    }

    #[test]
    fn test_relabel_error_leaves_metric_untouched() {
        let rule =
            Rule::try_from(RelabelConfig::new("labeldrop").regex("never-compiled")).unwrap();
        let engine = RelabelEngine {
            rules: vec![rule],
            cache: RegexCache::new(),
        };
        let mut metric = Metric::new("up", 1.0)
            .with_label("job", "node")
            .with_label("instance", "a:9100");
        let before = metric.clone();

        let err = engine.relabel(&mut metric).unwrap_err();
        assert!(matches!(err, RelabelError::PatternNotCompiled { .. }));
        assert_eq!(metric, before);
    }

    #[test]
    fn test_relabel_through_mutable_reference() {
        let engine = engine(vec![RelabelConfig::new("labeldrop").regex("^tmp$")]);
        let mut metric = Metric::new("up", 1.0)
            .with_label("tmp", "x")
            .with_label("job", "node");

        assert!(!engine.relabel(&mut metric).unwrap().is_dropped());
        assert_eq!(metric.labels, labels(&[("job", "node")]));
    }
}
