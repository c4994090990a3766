use crate::channel::ViolationReceiver;
use crate::telemetry::DISPATCH_FAILURES_TOTAL;
use futures::future::join_all;
use monitor_core::{MonitorError, ViolationRecord};
use monitor_export::DynExporter;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Outcome of delivering one record to every destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportStats {
    pub received: u64,
    pub delivered: u64,
    pub failed: u64,
}

/// Single consumer of the violation channel.
pub struct ExportWorker {
    exporters: Vec<DynExporter>,
    receiver: ViolationReceiver,
    dispatch_timeout: Duration,
    enabled: bool,
    stats: ExportStats,
}

impl ExportWorker {
    pub fn new(exporters: Vec<DynExporter>, receiver: ViolationReceiver) -> Self {
        Self {
            exporters,
            receiver,
            dispatch_timeout: Duration::from_secs(10),
            enabled: true,
            stats: ExportStats::default(),
        }
    }

    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    /// A disabled worker still consumes the channel but delivers nothing.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub async fn run(mut self, cancel: CancellationToken) -> ExportStats {
        info!(
            destinations = self.exporters.len(),
            enabled = self.enabled,
            "Export worker started"
        );

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = self.receiver.recv() => next,
            };

            match next {
                Some(record) => self.handle(record).await,
                None => break,
            }
        }

        self.receiver.close();
        let mut drained = 0usize;
        while let Some(record) = self.receiver.recv().await {
            drained += 1;
            self.handle(record).await;
        }
        if drained > 0 {
            info!(drained, "Drained queued violations before exit");
        }

        info!(
            received = self.stats.received,
            delivered = self.stats.delivered,
            failed = self.stats.failed,
            "Export worker stopped"
        );
        self.stats
    }

    async fn handle(&mut self, record: ViolationRecord) {
        self.stats.received += 1;
        if !self.enabled {
            debug!(id = %record.id, "Export disabled, discarding violation");
            return;
        }

        let report = self.dispatch(&record).await;
        self.stats.delivered += report.delivered as u64;
        self.stats.failed += report.failed as u64;
    }

    /// Send `record` to every destination concurrently. A failing or slow
    /// destination never affects the others.
    pub async fn dispatch(&self, record: &ViolationRecord) -> DispatchReport {
        let attempts = self.exporters.iter().map(|exporter| async move {
            let outcome = tokio::time::timeout(self.dispatch_timeout, exporter.export(record))
                .await
                .unwrap_or_else(|_| {
                    Err(MonitorError::dispatch(
                        exporter.name(),
                        format!("timed out after {:?}", self.dispatch_timeout),
                    ))
                });
            (exporter.name(), outcome)
        });

        let mut report = DispatchReport::default();
        for (destination, outcome) in join_all(attempts).await {
            match outcome {
                Ok(()) => {
                    debug!(id = %record.id, destination, "Violation exported");
                    report.delivered += 1;
                }
                Err(e) => {
                    metrics::counter!(
                        DISPATCH_FAILURES_TOTAL,
                        "destination" => destination.to_string()
                    )
                    .increment(1);
                    error!(id = %record.id, destination, error = %e, "Export failed");
                    report.failed += 1;
                }
            }
        }
        report
    }
}
