use crate::channel::ViolationSender;
use crate::telemetry::{
    COLLECTION_FAILURES_TOTAL, CYCLES_TOTAL, VIOLATIONS_DROPPED_TOTAL, VIOLATIONS_FIRED_TOTAL,
};
use monitor_core::{
    DataSourceSpec, DynCollector, HealthRegistry, MetricSample, MonitorError, ThresholdEvaluator,
    ThresholdRule, ViolationRecord,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Counters a source worker reports when it stops.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerStats {
    pub cycles: u64,
    pub collection_failures: u64,
    pub violations_sent: u64,
    pub violations_dropped: u64,
}

/// Drives one data source: collect, evaluate, publish, sleep.
pub struct SourceWorker {
    spec: Arc<DataSourceSpec>,
    collector: DynCollector,
    rules: Vec<ThresholdRule>,
    evaluator: ThresholdEvaluator,
    health: HealthRegistry,
    sender: ViolationSender,
    collect_timeout: Duration,
    stats: WorkerStats,
}

impl SourceWorker {
    pub fn new(
        spec: Arc<DataSourceSpec>,
        collector: DynCollector,
        health: HealthRegistry,
        sender: ViolationSender,
    ) -> Self {
        let collect_timeout = spec.timeout.unwrap_or(Duration::from_secs(10));
        Self {
            spec,
            collector,
            rules: Vec::new(),
            evaluator: ThresholdEvaluator::new(),
            health,
            sender,
            collect_timeout,
            stats: WorkerStats::default(),
        }
    }

    pub fn with_rules(mut self, rules: Vec<ThresholdRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Fallback used when the source sets no timeout of its own.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.collect_timeout = self.spec.timeout.unwrap_or(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub async fn run(mut self, cancel: CancellationToken) -> WorkerStats {
        info!(
            source = %self.spec.name,
            rules = self.rules.len(),
            "Starting worker for {}",
            self.spec.description()
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = tokio::time::timeout(self.collect_timeout, self.collector.collect()) => outcome,
            };

            self.stats.cycles += 1;
            metrics::counter!(CYCLES_TOTAL, "source" => self.spec.name.clone())
                .increment(1);

            match outcome {
                Ok(Ok(sample)) => self.process(sample).await,
                Ok(Err(e)) => self.record_failure(e).await,
                Err(_) => {
                    self.record_failure(MonitorError::CollectionTimeout(self.collect_timeout))
                        .await
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.spec.interval) => {}
            }
        }

        info!(
            source = %self.spec.name,
            cycles = self.stats.cycles,
            failures = self.stats.collection_failures,
            sent = self.stats.violations_sent,
            dropped = self.stats.violations_dropped,
            "Worker stopped"
        );
        self.stats
    }

    async fn record_failure(&mut self, e: MonitorError) {
        self.stats.collection_failures += 1;
        metrics::counter!(COLLECTION_FAILURES_TOTAL, "source" => self.spec.name.clone())
            .increment(1);
        error!(source = %self.spec.name, error = %e, "Collection failed");
        self.health.record_failure(&self.spec.name, &e).await;
    }

    async fn process(&mut self, sample: MetricSample) {
        debug!(
            source = %self.spec.name,
            metrics = sample.len(),
            "Collected sample"
        );

        for rule in &self.rules {
            match self.evaluator.evaluate(rule, &sample) {
                Ok(true) => {
                    if let Some(record) =
                        ViolationRecord::from_rule(rule, &sample, self.spec.kind)
                    {
                        metrics::counter!(
                            VIOLATIONS_FIRED_TOTAL,
                            "source" => self.spec.name.clone()
                        )
                        .increment(1);
                        warn!(
                            source = %self.spec.name,
                            rule = %rule.id,
                            "Threshold violation: {}",
                            record.summary()
                        );
                        match self.sender.offer(record) {
                            Ok(()) => self.stats.violations_sent += 1,
                            Err(e) => {
                                self.stats.violations_dropped += 1;
                                metrics::counter!(
                                    VIOLATIONS_DROPPED_TOTAL,
                                    "source" => self.spec.name.clone()
                                )
                                .increment(1);
                                warn!(source = %self.spec.name, error = %e, "Violation dropped");
                            }
                        }
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(source = %self.spec.name, rule = %rule.id, error = %e, "Rule skipped");
                }
            }
        }

        self.health.record_success(&self.spec.name, sample).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::violation_channel;
    use monitor_core::{async_trait, Collector, Comparison, HealthStatus, Result, SourceKind};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a script of outcomes, repeating the last one forever.
    struct ScriptedCollector {
        script: VecDeque<Option<f64>>,
        last: Option<f64>,
        calls: Arc<AtomicUsize>,
        hang: bool,
    }

    impl ScriptedCollector {
        fn new(script: Vec<Option<f64>>, calls: Arc<AtomicUsize>) -> Self {
            Self {
                script: script.into(),
                last: None,
                calls,
                hang: false,
            }
        }
    }

    #[async_trait]
    impl Collector for ScriptedCollector {
        async fn collect(&mut self) -> Result<MetricSample> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            if let Some(next) = self.script.pop_front() {
                self.last = next;
            }
            match self.last {
                Some(value) => Ok(MetricSample::from_pairs([("load", value)])),
                None => Err(MonitorError::Collection("source unreachable".to_string())),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn kind(&self) -> SourceKind {
            SourceKind::JsonFile
        }
    }

    fn spec(interval: Duration) -> Arc<DataSourceSpec> {
        Arc::new(DataSourceSpec::new("app", SourceKind::JsonFile, interval))
    }

    async fn wait_for_calls(calls: &AtomicUsize, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while calls.load(Ordering::SeqCst) < n {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_during_sleep_exits_without_collecting() {
        let calls = Arc::new(AtomicUsize::new(0));
        let collector = ScriptedCollector::new(vec![Some(1.0)], calls.clone());
        let (tx, _rx) = violation_channel(4);
        let health = HealthRegistry::new();
        let worker = SourceWorker::new(
            spec(Duration::from_secs(3600)),
            Box::new(collector),
            health.clone(),
            tx,
        );

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(worker.run(cancel.clone()));
        wait_for_calls(&calls, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        cancel.cancel();
        let stats = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(stats.cycles, 1);
        assert!(health.get("app").await.unwrap().is_healthy());
    }

    #[tokio::test]
    async fn test_full_channel_drops_and_keeps_cycling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let script = [60.0, 10.0].repeat(5).into_iter().map(Some).collect();
        let collector = ScriptedCollector::new(script, calls.clone());
        let (tx, _rx) = violation_channel(1);
        let rule =
            ThresholdRule::new("app", "load", Comparison::GreaterThan, 50.0).with_id(0);
        let worker = SourceWorker::new(
            spec(Duration::from_millis(1)),
            Box::new(collector),
            HealthRegistry::new(),
            tx,
        )
        .with_rules(vec![rule]);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(worker.run(cancel.clone()));
        wait_for_calls(&calls, 10).await;
        cancel.cancel();
        let stats = handle.await.unwrap();

        assert!(stats.cycles >= 9);
        assert_eq!(stats.violations_sent, 1);
        assert!(stats.violations_dropped >= 3);
    }

    #[tokio::test]
    async fn test_health_tracks_collection_outcome() {
        let calls = Arc::new(AtomicUsize::new(0));
        let collector = ScriptedCollector::new(vec![Some(90.0), None], calls.clone());
        let (tx, mut rx) = violation_channel(8);
        let health = HealthRegistry::new();
        let rule =
            ThresholdRule::new("app", "load", Comparison::GreaterThan, 50.0).with_id(0);
        let worker = SourceWorker::new(
            spec(Duration::from_millis(5)),
            Box::new(collector),
            health.clone(),
            tx,
        )
        .with_rules(vec![rule]);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(worker.run(cancel.clone()));

        let record = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.value, 90.0);

        wait_for_calls(&calls, 3).await;
        cancel.cancel();
        let stats = handle.await.unwrap();

        let entry = health.get("app").await.unwrap();
        assert_eq!(entry.status, HealthStatus::Error);
        assert_eq!(entry.sample.unwrap().get("load"), Some(90.0));
        assert!(stats.collection_failures >= 1);
        assert_eq!(stats.violations_sent, 1);
    }

    #[tokio::test]
    async fn test_slow_collection_times_out() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut collector = ScriptedCollector::new(vec![Some(1.0)], calls.clone());
        collector.hang = true;
        let (tx, _rx) = violation_channel(1);
        let health = HealthRegistry::new();
        let worker = SourceWorker::new(
            spec(Duration::from_secs(3600)),
            Box::new(collector),
            health.clone(),
            tx,
        )
        .with_default_timeout(Duration::from_millis(20));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(worker.run(cancel.clone()));
        tokio::time::timeout(Duration::from_secs(5), async {
            while health.get("app").await.is_none() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        cancel.cancel();
        let stats = handle.await.unwrap();

        let entry = health.get("app").await.unwrap();
        assert!(!entry.is_healthy());
        assert!(entry.error.unwrap().contains("timed out"));
        assert_eq!(stats.collection_failures, 1);
    }
}
