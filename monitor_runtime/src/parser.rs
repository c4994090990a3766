use crate::config::MonitorConfig;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn parse_config_from_file(path: impl AsRef<Path>) -> Result<MonitorConfig> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let extension = path.extension().and_then(|s| s.to_str());

    match extension {
        Some("yaml") | Some("yml") => parse_yaml(&contents),
        Some("toml") => parse_toml(&contents),
        Some("json") => parse_json(&contents),
        _ => Err(anyhow::anyhow!(
            "Unsupported file format. Use .yaml, .yml, .toml, or .json"
        )),
    }
}

pub fn parse_config_from_str(content: &str, format: &str) -> Result<MonitorConfig> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => parse_yaml(content),
        "toml" => parse_toml(content),
        "json" => parse_json(content),
        _ => Err(anyhow::anyhow!("Unsupported format: {}", format)),
    }
}

fn finish(mut config: MonitorConfig) -> Result<MonitorConfig> {
    config.normalize();
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}

fn parse_yaml(content: &str) -> Result<MonitorConfig> {
    finish(serde_yaml::from_str(content)?)
}

fn parse_toml(content: &str) -> Result<MonitorConfig> {
    finish(toml::from_str(content)?)
}

fn parse_json(content: &str) -> Result<MonitorConfig> {
    finish(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::{Comparison, RuleId, SourceKind};
    use monitor_export::DestinationKind;
    use std::time::Duration;

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
sources:
  - name: cpu_usage
    type: system_metric
    params: { metric: cpu }
    interval: 10s
    timeout: 5s
rules:
  - source: cpu_usage
    metric: cpu_percent
    comparison: greater_than
    threshold: 80.0
    consecutive: 3
export:
  channel_capacity: 50
  destinations:
    - type: file
      params: { directory: ./exports, formats: [json, csv] }
monitoring:
  status_interval: 1m
"#;

        let config = parse_yaml(yaml).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].kind, SourceKind::SystemMetric);
        assert_eq!(config.sources[0].timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.rules[0].consecutive, 3);
        assert_eq!(config.export.channel_capacity, 50);
        assert_eq!(config.export.destinations[0].kind, DestinationKind::File);
        assert_eq!(config.monitoring.status_interval, Duration::from_secs(60));
        assert_eq!(config.monitoring.shutdown_grace, Duration::from_secs(5));
    }

    #[test]
    fn test_parse_yaml_legacy_names() {
        let yaml = r#"
data_sources:
  - name: api
    type: api_endpoint
    params: { url: "http://localhost:9000/metrics" }
    interval: 15
threshold_rules:
  - data_source: api
    metric_name: latency
    threshold_type: ">="
    threshold_value: 250
    consecutive_violations: 2
  - data_source: api
    metric_name: errors
    threshold_type: greater_than
    threshold_value: 0
export_settings:
  enabled: false
monitoring:
  check_interval: 45
"#;

        let config = parse_yaml(yaml).unwrap();
        assert_eq!(config.sources[0].kind, SourceKind::HttpEndpoint);
        assert_eq!(config.sources[0].interval, Duration::from_secs(15));
        assert_eq!(config.rules[0].comparison, Comparison::GreaterThanOrEqual);
        assert_eq!(config.rules[1].id, RuleId(1));
        assert!(!config.export.enabled);
        assert_eq!(config.monitoring.status_interval, Duration::from_secs(45));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[[sources]]
name = "app"
type = "json_file"
interval = "5s"
params = { path = "/var/run/app/metrics.json" }

[[rules]]
source = "app"
metric = "queue.depth"
comparison = "greater_than"
threshold = 100.0

[export]
dispatch_timeout = "3s"
"#;

        let config = parse_toml(toml).unwrap();
        assert_eq!(config.sources[0].name, "app");
        assert_eq!(config.rules[0].metric, "queue.depth");
        assert_eq!(config.export.dispatch_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_parse_json() {
        let json = r#"
{
  "sources": [
    { "name": "mem", "type": "system_metric", "params": { "metric": "memory" }, "interval": "30s" }
  ],
  "rules": [
    { "source": "mem", "metric": "memory_percent", "comparison": "greater_than", "threshold": 90 }
  ]
}
"#;

        let config = parse_json(json).unwrap();
        assert_eq!(config.rules[0].threshold, 90.0);
        assert_eq!(config.rules[0].consecutive, 1);
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let yaml = r#"
sources:
  - name: app
    type: json_file
    interval: 5s
rules:
  - source: missing
    metric: x
    comparison: less_than
    threshold: 1
"#;
        assert!(parse_yaml(yaml).is_err());
        assert!(parse_config_from_str("{}", "ini").is_err());
    }

    #[test]
    fn test_parse_flat_legacy_layout_builds_runtime_parts() {
        let yaml = r#"
data_sources:
  - name: cpu_usage
    type: system_metric
    source: psutil.cpu_percent
    interval: 2
    enabled: true
  - name: app
    type: json_file
    path: /var/run/app/metrics.json
    interval: 5
threshold_rules:
  - data_source: cpu_usage
    metric_name: cpu_percent
    threshold_type: greater_than
    threshold_value: 0.1
    consecutive_violations: 1
    enabled: true
export_settings:
  enabled: true
  export_formats: [json]
  export_directory: ./test_exports
  max_export_files: 10
  compress_exports: false
  destinations:
    - type: file
      enabled: true
logging:
  level: INFO
  max_size_mb: 1
  backup_count: 2
monitoring:
  max_workers: 2
  check_interval: 1
  data_retention_hours: 1
"#;

        let config = parse_yaml(yaml).unwrap();
        assert_eq!(config.sources[0].interval, Duration::from_secs(2));
        assert!(config.sources[0].params.is_empty());
        for source in &config.sources {
            monitor_core::collectors::for_source(source).unwrap();
        }

        let file = &config.export.destinations[0];
        assert_eq!(file.inline["directory"], "./test_exports");
        assert_eq!(file.inline["max_files"], 10);
        let exporter: monitor_export::DynExporter = monitor_export::from_destination(file).unwrap();
        assert_eq!(exporter.kind(), DestinationKind::File);
        assert_eq!(config.monitoring.status_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_parse_rejects_huge_durations_without_panicking() {
        let huge_interval = r#"
sources:
  - name: app
    type: json_file
    params: { path: metrics.json }
    interval: 1e20
"#;
        assert!(parse_yaml(huge_interval).is_err());

        let huge_grace = r#"
sources:
  - name: app
    type: json_file
    params: { path: metrics.json }
    interval: 5s
monitoring:
  shutdown_grace: 1e19
  status_interval: 1e19
"#;
        assert!(parse_yaml(huge_grace).is_err());
    }

    #[tokio::test]
    async fn test_parse_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        tokio::fs::write(
            &path,
            r#"{"sources":[{"name":"a","type":"json_file","interval":1,"params":{"path":"x.json"}}]}"#,
        )
        .await
        .unwrap();

        let config = parse_config_from_file(&path).await.unwrap();
        assert_eq!(config.sources[0].name, "a");

        let unsupported = dir.path().join("monitor.ini");
        tokio::fs::write(&unsupported, "").await.unwrap();
        assert!(parse_config_from_file(&unsupported).await.is_err());
    }
}
