use crate::{
    rule::{Comparison, ThresholdRule},
    sample::MetricSample,
    source::SourceKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Context attached to every violation for the benefit of destinations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViolationMetadata {
    pub rule: ThresholdRule,
    pub all_metrics: BTreeMap<String, f64>,
    pub source_kind: SourceKind,
    pub collected_at: DateTime<Utc>,
}

/// A confirmed violation, immutable once built by a source worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViolationRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub metric: String,
    pub value: f64,
    pub threshold: f64,
    pub comparison: Comparison,
    pub metadata: ViolationMetadata,
}

impl ViolationRecord {
    /// Build a record for a rule that fired on `sample`. Returns `None` when
    /// the sample does not carry the rule's metric.
    pub fn from_rule(
        rule: &ThresholdRule,
        sample: &MetricSample,
        source_kind: SourceKind,
    ) -> Option<Self> {
        let value = sample.get(&rule.metric)?;

        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            source: rule.source.clone(),
            metric: rule.metric.clone(),
            value,
            threshold: rule.threshold,
            comparison: rule.comparison,
            metadata: ViolationMetadata {
                rule: rule.clone(),
                all_metrics: sample.values.clone(),
                source_kind,
                collected_at: sample.collected_at,
            },
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "{}.{} = {} ({} {})",
            self.source, self.metric, self.value, self.comparison, self.threshold
        )
    }
}
