use crate::{
    channel::violation_channel,
    config::MonitorConfig,
    export_worker::{ExportStats, ExportWorker},
    status::run_status_reporter,
    worker::{SourceWorker, WorkerStats},
};
use monitor_core::{
    collectors, DataSourceSpec, DynCollector, HealthEntry, HealthRegistry, MonitorError, Result,
    ThresholdRule,
};
use monitor_export::{from_destination, DynExporter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const STATUS_TASK: &str = "status_reporter";
const EXPORT_TASK: &str = "export";

type PlannedSource = (Arc<DataSourceSpec>, DynCollector, Vec<ThresholdRule>);

/// Owns the configuration and starts the monitor.
pub struct Supervisor {
    config: MonitorConfig,
    health: HealthRegistry,
}

impl Supervisor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            health: HealthRegistry::new(),
        }
    }

    pub fn health(&self) -> HealthRegistry {
        self.health.clone()
    }

    /// Build every collector and exporter, then spawn the tasks. Nothing is
    /// spawned when any of them fails to build.
    pub fn start(mut self) -> Result<MonitorHandle> {
        self.config.normalize();
        self.config
            .validate()
            .map_err(MonitorError::InvalidConfig)?;

        let mut planned = Vec::new();
        for spec in self.config.enabled_sources() {
            let collector = collectors::for_source(spec)?;
            let rules = self.config.rules_for(&spec.name);
            planned.push((Arc::new(spec.clone()), collector, rules));
        }

        let exporters: Vec<DynExporter> = if self.config.export.enabled {
            self.config
                .export
                .destinations
                .iter()
                .filter(|d| d.enabled)
                .map(from_destination)
                .collect::<Result<_>>()?
        } else {
            Vec::new()
        };

        Ok(self.launch(planned, exporters))
    }

    fn launch(self, planned: Vec<PlannedSource>, exporters: Vec<DynExporter>) -> MonitorHandle {
        if planned.is_empty() {
            warn!("No enabled data sources; only the export worker will run");
        }
        if self.config.export.enabled && exporters.is_empty() {
            warn!("Export is enabled but no destination is configured");
        }

        let source_cancel = CancellationToken::new();
        let export_cancel = CancellationToken::new();
        let (sender, receiver) = violation_channel(self.config.export.channel_capacity);
        let monitoring = &self.config.monitoring;

        let mut sources = Vec::with_capacity(planned.len());
        for (spec, collector, rules) in planned {
            let name = spec.name.clone();
            let worker = SourceWorker::new(spec, collector, self.health.clone(), sender.clone())
                .with_rules(rules)
                .with_default_timeout(monitoring.collect_timeout);
            let handle = tokio::spawn(worker.run(source_cancel.child_token()));
            sources.push((name, handle));
        }
        // Export stops on its own once every source worker has dropped its sender.
        drop(sender);

        let export = ExportWorker::new(exporters, receiver)
            .with_dispatch_timeout(self.config.export.dispatch_timeout)
            .enabled(self.config.export.enabled);
        let export = tokio::spawn(export.run(export_cancel.clone()));

        let status = tokio::spawn(run_status_reporter(
            self.health.clone(),
            monitoring.status_interval,
            source_cancel.child_token(),
        ));

        info!(
            sources = sources.len(),
            rules = self.config.rules.iter().filter(|r| r.enabled).count(),
            destinations = self.config.export.destinations.iter().filter(|d| d.enabled).count(),
            "Monitor started"
        );

        MonitorHandle {
            health: self.health,
            source_cancel,
            export_cancel,
            sources,
            status,
            export,
            grace: monitoring.shutdown_grace,
        }
    }
}

/// Result of stopping the monitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShutdownReport {
    /// Tasks that observed the stop signal and returned on their own
    pub graceful: Vec<String>,
    /// Tasks aborted after the grace period, or that panicked
    pub forced: Vec<String>,
    pub worker_stats: HashMap<String, WorkerStats>,
    pub export_stats: Option<ExportStats>,
    #[serde(with = "monitor_core::duration")]
    pub elapsed: Duration,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.forced.is_empty()
    }

    pub fn violations_sent(&self) -> u64 {
        self.worker_stats.values().map(|s| s.violations_sent).sum()
    }

    pub fn violations_dropped(&self) -> u64 {
        self.worker_stats.values().map(|s| s.violations_dropped).sum()
    }
}

/// Running monitor.
pub struct MonitorHandle {
    health: HealthRegistry,
    source_cancel: CancellationToken,
    export_cancel: CancellationToken,
    sources: Vec<(String, JoinHandle<WorkerStats>)>,
    status: JoinHandle<()>,
    export: JoinHandle<ExportStats>,
    grace: Duration,
}

impl MonitorHandle {
    pub fn health(&self) -> HealthRegistry {
        self.health.clone()
    }

    pub async fn health_snapshot(&self) -> HashMap<String, HealthEntry> {
        self.health.snapshot().await
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn grace_period(&self) -> Duration {
        self.grace
    }

    /// Signal source workers and the status reporter to stop. Returns
    /// immediately; the export worker finishes once the queue is drained.
    pub fn request_stop(&self) {
        if !self.source_cancel.is_cancelled() {
            info!("Stop requested");
        }
        self.source_cancel.cancel();
    }

    /// Stop everything within the grace period. Sources go first so the
    /// export worker can drain what they queued; whatever is still running
    /// at the deadline is aborted.
    pub async fn shutdown(self) -> ShutdownReport {
        let started = Instant::now();
        let deadline = started + self.grace;
        let mut report = ShutdownReport::default();

        self.request_stop();

        for (name, handle) in self.sources {
            if let Some(stats) = join_until(&name, handle, deadline, &mut report).await {
                report.worker_stats.insert(name, stats);
            }
        }
        join_until(STATUS_TASK, self.status, deadline, &mut report).await;

        self.export_cancel.cancel();
        report.export_stats = join_until(EXPORT_TASK, self.export, deadline, &mut report).await;

        report.elapsed = started.elapsed();
        if report.is_clean() {
            info!(elapsed = ?report.elapsed, "Monitor stopped");
        } else {
            warn!(
                forced = report.forced.len(),
                elapsed = ?report.elapsed,
                "Monitor stopped with forced terminations"
            );
        }
        report
    }
}

async fn join_until<T>(
    name: &str,
    mut handle: JoinHandle<T>,
    deadline: Instant,
    report: &mut ShutdownReport,
) -> Option<T> {
    match tokio::time::timeout_at(deadline, &mut handle).await {
        Ok(Ok(value)) => {
            report.graceful.push(name.to_string());
            Some(value)
        }
        Ok(Err(e)) => {
            error!(task = name, error = %e, "Task ended abnormally");
            report.forced.push(name.to_string());
            None
        }
        Err(_) => {
            warn!(task = name, "Task did not stop within the grace period, aborting");
            handle.abort();
            report.forced.push(name.to_string());
            None
        }
    }
}
