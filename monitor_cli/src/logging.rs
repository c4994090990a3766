use anyhow::Result;
use monitor_runtime::LoggingSettings;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

/// Flags beat `RUST_LOG`, which beats the configured level.
fn filter(verbosity: Verbosity, settings: &LoggingSettings) -> EnvFilter {
    match verbosity {
        Verbosity::Verbose => EnvFilter::new("debug"),
        Verbosity::Quiet => EnvFilter::new("error"),
        Verbosity::Normal => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.level)),
    }
}

/// Install the global subscriber. The returned guard flushes the log file
/// and must be held until exit.
pub fn init(verbosity: Verbosity, settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let (file_writer, guard) = match &settings.file {
        Some(file) => {
            let path = Path::new(file);
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let prefix = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("monitor.log");
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let plain = (!settings.json).then(|| fmt::layer().with_target(false));
    let json = settings.json.then(|| fmt::layer().json());
    let file = file_writer.map(|writer| fmt::layer().with_writer(writer).with_ansi(false));

    tracing_subscriber::registry()
        .with(filter(verbosity, settings))
        .with(plain)
        .with(json)
        .with(file)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;

    Ok(guard)
}
