use crate::{destination::DestinationKind, exporters::Exporter};
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use monitor_core::{Result, ViolationRecord};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

const FILE_PREFIX: &str = "threshold_violation_";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

fn default_formats() -> Vec<ExportFormat> {
    vec![ExportFormat::Json]
}

fn default_max_files() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileExportConfig {
    #[serde(alias = "export_directory")]
    pub directory: PathBuf,
    #[serde(alias = "export_formats", default = "default_formats")]
    pub formats: Vec<ExportFormat>,
    /// Newest files kept in `directory`; older exports are removed
    #[serde(alias = "max_export_files", default = "default_max_files")]
    pub max_files: usize,
    /// Store artifacts gzip-compressed with a trailing `.gz`
    #[serde(alias = "compress_exports", default)]
    pub compress: bool,
}

/// Writes one artifact per record and format, then prunes old artifacts.
pub struct FileExporter {
    name: String,
    config: FileExportConfig,
}

impl FileExporter {
    pub fn new(name: impl Into<String>, config: FileExportConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    fn file_path(&self, record: &ViolationRecord, format: ExportFormat) -> PathBuf {
        let short_id: String = record.id.chars().take(8).collect();
        self.config.directory.join(format!(
            "{}{}_{}.{}{}",
            FILE_PREFIX,
            record.timestamp.format("%Y%m%d_%H%M%S"),
            short_id,
            format.extension(),
            if self.config.compress { ".gz" } else { "" }
        ))
    }

    async fn cleanup_old_exports(&self) -> Result<usize> {
        let mut exports: Vec<(SystemTime, PathBuf)> = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.config.directory).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_export_file(&path) {
                continue;
            }
            let modified = entry
                .metadata()
                .await?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            exports.push((modified, path));
        }

        if exports.len() <= self.config.max_files {
            return Ok(0);
        }

        // Newest first; ties broken by name so the timestamped names decide.
        exports.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        let mut removed = 0;
        for (_, path) in exports.into_iter().skip(self.config.max_files) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    info!("Removed old export file: {}", path.display());
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove old export file {}: {}", path.display(), e),
            }
        }

        Ok(removed)
    }
}

fn is_export_file(path: &Path) -> bool {
    let named = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(FILE_PREFIX))
        .unwrap_or(false);
    let stem = match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => path.file_stem().map(Path::new),
        _ => Some(path),
    };
    let extension = stem.and_then(|p| p.extension()).and_then(|e| e.to_str());

    named && matches!(extension, Some("json") | Some("csv"))
}

fn gzip(contents: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(contents)?;
    Ok(encoder.finish()?)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn to_csv(record: &ViolationRecord) -> Result<String> {
    let metadata = serde_json::to_string(&record.metadata)?;
    let row = [
        record.id.clone(),
        record.timestamp.to_rfc3339(),
        record.source.clone(),
        record.metric.clone(),
        record.value.to_string(),
        record.threshold.to_string(),
        record.comparison.to_string(),
        metadata,
    ];

    Ok(format!(
        "id,timestamp,source,metric,value,threshold,comparison,metadata\n{}\n",
        row.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",")
    ))
}

pub fn to_json(record: &ViolationRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

#[async_trait]
impl Exporter for FileExporter {
    async fn export(&self, record: &ViolationRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.directory).await?;

        for format in &self.config.formats {
            let contents = match format {
                ExportFormat::Json => to_json(record)?,
                ExportFormat::Csv => to_csv(record)?,
            };
            let path = self.file_path(record, *format);
            if self.config.compress {
                tokio::fs::write(&path, gzip(contents.as_bytes())?).await?;
            } else {
                tokio::fs::write(&path, contents).await?;
            }
            info!("Exported violation {} to {}", record.id, path.display());
        }

        // Prune failures are logged only; the artifacts are already written.
        if let Err(e) = self.cleanup_old_exports().await {
            warn!(
                "Failed to prune old exports in {}: {}",
                self.config.directory.display(),
                e
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DestinationKind {
        DestinationKind::File
    }
}
