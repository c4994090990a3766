pub mod email;
pub mod file;
pub mod log;
pub mod webhook;

use crate::destination::{DestinationConfig, DestinationKind};
use async_trait::async_trait;
use monitor_core::{Result, ViolationRecord};
use std::sync::Arc;

pub use email::{EmailConfig, EmailExporter};
pub use file::{ExportFormat, FileExportConfig, FileExporter};
pub use log::LogExporter;
pub use webhook::{WebhookConfig, WebhookExporter};

/// Sink for confirmed violations.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Deliver one record to the destination
    async fn export(&self, record: &ViolationRecord) -> Result<()>;

    /// Label used in logs and dispatch reports
    fn name(&self) -> &str;

    fn kind(&self) -> DestinationKind;
}

pub type DynExporter = Arc<dyn Exporter>;

/// Build the exporter for a destination, decoding and checking its params.
pub fn from_destination(config: &DestinationConfig) -> Result<DynExporter> {
    let name = config.label();

    let exporter: DynExporter = match config.kind {
        DestinationKind::File => Arc::new(FileExporter::new(name, config.params_as()?)),
        DestinationKind::Webhook => Arc::new(WebhookExporter::new(name, config.params_as()?)?),
        DestinationKind::Email => Arc::new(EmailExporter::new(name, config.params_as()?)?),
        DestinationKind::Log => Arc::new(LogExporter::new(name)),
    };

    Ok(exporter)
}

pub fn supported_kinds() -> Vec<String> {
    DestinationKind::ALL.iter().map(|k| k.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::MonitorError;

    #[test]
    fn test_from_destination() {
        let file = DestinationConfig::new(DestinationKind::File).with_param("directory", "/tmp/x");
        let exporter = from_destination(&file).unwrap();
        assert_eq!(exporter.kind(), DestinationKind::File);
        assert_eq!(exporter.name(), "file");

        let log = DestinationConfig::new(DestinationKind::Log).named("audit");
        assert_eq!(from_destination(&log).unwrap().name(), "audit");
    }

    #[test]
    fn test_from_destination_requires_params() {
        let webhook = DestinationConfig::new(DestinationKind::Webhook);
        assert!(matches!(
            from_destination(&webhook),
            Err(MonitorError::InvalidConfig(_))
        ));
    }
}
