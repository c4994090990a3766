pub mod channel;
pub mod config;
pub mod export_worker;
pub mod parser;
pub mod status;
pub mod supervisor;
pub mod telemetry;
pub mod worker;

pub use channel::{violation_channel, ViolationReceiver, ViolationSender};
pub use config::{ExportSettings, LoggingSettings, MonitorConfig, MonitoringSettings};
pub use export_worker::{DispatchReport, ExportStats, ExportWorker};
pub use parser::{parse_config_from_file, parse_config_from_str};
pub use status::{run_status_reporter, summarize, StatusSummary};
pub use supervisor::{MonitorHandle, ShutdownReport, Supervisor};
pub use worker::{SourceWorker, WorkerStats};
pub use telemetry::describe_metrics;
