use crate::{
    collectors::Collector,
    error::{MonitorError, Result},
    sample::MetricSample,
    source::SourceKind,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonFileConfig {
    #[serde(alias = "source")]
    pub path: PathBuf,
}

/// Reads a JSON document from disk on every cycle.
pub struct JsonFileCollector {
    name: String,
    config: JsonFileConfig,
}

impl JsonFileCollector {
    pub fn new(name: impl Into<String>, config: JsonFileConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

#[async_trait]
impl Collector for JsonFileCollector {
    async fn collect(&mut self) -> Result<MetricSample> {
        let contents = tokio::fs::read_to_string(&self.config.path).await?;
        let document: serde_json::Value = serde_json::from_str(&contents).map_err(|e| {
            MonitorError::MalformedPayload(format!("{}: {}", self.config.path.display(), e))
        })?;

        let values = MetricSample::flatten_json(&document);
        if values.is_empty() {
            return Err(MonitorError::MalformedPayload(format!(
                "{} contains no numeric values",
                self.config.path.display()
            )));
        }

        Ok(MetricSample::new(values))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::JsonFile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_current_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let mut collector = JsonFileCollector::new("file", JsonFileConfig { path: path.clone() });

        tokio::fs::write(&path, r#"{"temperature": 21.5}"#).await.unwrap();
        assert_eq!(collector.collect().await.unwrap().get("temperature"), Some(21.5));

        tokio::fs::write(&path, r#"{"temperature": 80}"#).await.unwrap();
        assert_eq!(collector.collect().await.unwrap().get("temperature"), Some(80.0));
    }

    #[tokio::test]
    async fn test_missing_and_malformed_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let mut collector = JsonFileCollector::new("file", JsonFileConfig { path: path.clone() });

        let err = collector.collect().await.unwrap_err();
        assert!(matches!(err, MonitorError::IoError(_)));

        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(matches!(
            collector.collect().await,
            Err(MonitorError::MalformedPayload(_))
        ));
    }
}
