use crate::{destination::DestinationKind, exporters::Exporter};
use async_trait::async_trait;
use monitor_core::{Result, ViolationRecord};
use tracing::warn;

/// Emits each violation as a structured `tracing` event.
pub struct LogExporter {
    name: String,
}

impl LogExporter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Exporter for LogExporter {
    async fn export(&self, record: &ViolationRecord) -> Result<()> {
        warn!(
            target: "monitor::violations",
            id = %record.id,
            source = %record.source,
            metric = %record.metric,
            value = record.value,
            threshold = record.threshold,
            comparison = %record.comparison,
            "Threshold violation"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DestinationKind {
        DestinationKind::Log
    }
}
