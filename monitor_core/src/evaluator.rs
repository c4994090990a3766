use crate::{
    error::{MonitorError, Result},
    rule::{RuleId, ThresholdRule},
    sample::MetricSample,
};
use std::collections::HashMap;
use tracing::debug;

/// Consecutive-violation tracking for the rules of a single source.
///
/// Each source worker owns exactly one evaluator, so the counters are never
/// shared and need no locking. A rule fires on the sample that brings its
/// counter to `consecutive`; further violating samples keep counting but do
/// not fire again until a passing sample resets the counter.
#[derive(Debug, Default)]
pub struct ThresholdEvaluator {
    counters: HashMap<RuleId, u32>,
}

impl ThresholdEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&mut self, rule: &ThresholdRule, sample: &MetricSample) -> Result<bool> {
        if rule.consecutive == 0 {
            return Err(MonitorError::Evaluation(format!(
                "{} has a consecutive count of zero",
                rule.description()
            )));
        }

        let value = match sample.get(&rule.metric) {
            Some(value) => value,
            None => return Ok(false),
        };

        if !value.is_finite() {
            return Err(MonitorError::Evaluation(format!(
                "metric '{}' of '{}' is not a finite number ({})",
                rule.metric, rule.source, value
            )));
        }

        let counter = self.counters.entry(rule.id).or_insert(0);
        if rule.comparison.violates(value, rule.threshold) {
            *counter = counter.saturating_add(1);
        } else {
            *counter = 0;
        }

        debug!(
            rule = %rule.id,
            metric = %rule.metric,
            value,
            count = *counter,
            required = rule.consecutive,
            "Evaluated rule"
        );

        Ok(*counter == rule.consecutive)
    }

    /// Current consecutive-violation count for a rule (0 if never seen).
    pub fn count(&self, rule: RuleId) -> u32 {
        self.counters.get(&rule).copied().unwrap_or(0)
    }
}
