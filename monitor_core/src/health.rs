use crate::sample::MetricSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthEntry {
    pub last_update: DateTime<Utc>,
    /// Most recent successful sample; kept across failed cycles.
    pub sample: Option<MetricSample>,
    pub status: HealthStatus,
    pub error: Option<String>,
}

impl HealthEntry {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Liveness map shared by all source workers and any number of readers.
///
/// Each source writes only its own key, so writers never contend on an
/// entry; readers get an owned snapshot and may observe entries of
/// different ages across sources.
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    entries: Arc<RwLock<HashMap<String, HealthEntry>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_success(&self, source: &str, sample: MetricSample) {
        let entry = HealthEntry {
            last_update: Utc::now(),
            sample: Some(sample),
            status: HealthStatus::Healthy,
            error: None,
        };
        self.entries.write().await.insert(source.to_string(), entry);
    }

    pub async fn record_failure(&self, source: &str, error: impl ToString) {
        let mut entries = self.entries.write().await;
        let previous = entries.remove(source).and_then(|entry| entry.sample);
        entries.insert(
            source.to_string(),
            HealthEntry {
                last_update: Utc::now(),
                sample: previous,
                status: HealthStatus::Error,
                error: Some(error.to_string()),
            },
        );
    }

    pub async fn get(&self, source: &str) -> Option<HealthEntry> {
        self.entries.read().await.get(source).cloned()
    }

    pub async fn snapshot(&self) -> HashMap<String, HealthEntry> {
        self.entries.read().await.clone()
    }

    /// Names of sources whose last cycle failed, with the error detail.
    pub async fn unhealthy(&self) -> Vec<(String, String)> {
        let mut failing: Vec<(String, String)> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, entry)| !entry.is_healthy())
            .map(|(name, entry)| (name.clone(), entry.error.clone().unwrap_or_default()))
            .collect();
        failing.sort();
        failing
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_then_failure_keeps_sample() {
        let registry = HealthRegistry::new();
        registry
            .record_success("cpu", MetricSample::from_pairs([("cpu_percent", 10.0)]))
            .await;

        let entry = registry.get("cpu").await.unwrap();
        assert!(entry.is_healthy());
        assert!(entry.error.is_none());

        registry.record_failure("cpu", "connection refused").await;
        let entry = registry.get("cpu").await.unwrap();
        assert_eq!(entry.status, HealthStatus::Error);
        assert_eq!(entry.error.as_deref(), Some("connection refused"));
        assert_eq!(entry.sample.unwrap().get("cpu_percent"), Some(10.0));

        registry
            .record_success("cpu", MetricSample::from_pairs([("cpu_percent", 20.0)]))
            .await;
        assert!(registry.get("cpu").await.unwrap().is_healthy());
    }

    #[tokio::test]
    async fn test_concurrent_writers_and_readers() {
        let registry = HealthRegistry::new();
        let mut handles = Vec::new();

        for i in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let name = format!("source-{}", i);
                for n in 0..50 {
                    if n % 2 == 0 {
                        registry
                            .record_success(&name, MetricSample::from_pairs([("n", n as f64)]))
                            .await;
                    } else {
                        registry.record_failure(&name, "flaky").await;
                    }
                    let _ = registry.snapshot().await;
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 8);
        assert_eq!(registry.unhealthy().await.len(), 8);
    }
}
