use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Selects which collector implementation serves a source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Host resources read through the OS (cpu, memory, disk, network)
    SystemMetric,

    /// JSON metrics document fetched over HTTP
    #[serde(alias = "api_endpoint")]
    HttpEndpoint,

    /// JSON metrics document read from disk
    JsonFile,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::SystemMetric,
        SourceKind::HttpEndpoint,
        SourceKind::JsonFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::SystemMetric => "system_metric",
            SourceKind::HttpEndpoint => "http_endpoint",
            SourceKind::JsonFile => "json_file",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_enabled() -> bool {
    true
}

/// Identity and polling contract for one data source.
///
/// Kind-specific settings may be given either nested under `params` or
/// inline next to `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSourceSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
    #[serde(with = "crate::duration")]
    pub interval: Duration,
    /// Per-call collection timeout; the monitor-wide default applies when unset.
    #[serde(with = "crate::duration::option", default)]
    pub timeout: Option<Duration>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub inline: HashMap<String, serde_json::Value>,
}

impl DataSourceSpec {
    pub fn new(name: impl Into<String>, kind: SourceKind, interval: Duration) -> Self {
        Self {
            name: name.into(),
            kind,
            params: HashMap::new(),
            interval,
            timeout: None,
            enabled: true,
            inline: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Decode the merged inline and nested params into the kind-specific
    /// settings type; nested keys win.
    pub fn params_as<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        let object = serde_json::Value::Object(
            self.inline
                .iter()
                .chain(self.params.iter())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        serde_json::from_value(object).map_err(|e| {
            crate::MonitorError::InvalidConfig(format!(
                "Invalid params for source '{}' ({}): {}",
                self.name, self.kind, e
            ))
        })
    }

    pub fn description(&self) -> String {
        format!("{} '{}' every {:?}", self.kind, self.name, self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct PathParams {
        path: String,
    }

    #[test]
    fn test_source_description() {
        let spec = DataSourceSpec::new("cpu", SourceKind::SystemMetric, Duration::from_secs(5));
        assert_eq!(spec.description(), "system_metric 'cpu' every 5s");
    }

    #[test]
    fn test_inline_params_merge_with_nested() {
        let spec: DataSourceSpec = serde_json::from_str(
            r#"{"name": "disk", "type": "json_file", "interval": 5,
                "path": "/inline.json", "params": {"path": "/nested.json"}}"#,
        )
        .unwrap();
        let params: PathParams = spec.params_as().unwrap();
        assert_eq!(params.path, "/nested.json");

        let spec: DataSourceSpec = serde_json::from_str(
            r#"{"name": "disk", "type": "json_file", "interval": 5, "path": "/inline.json"}"#,
        )
        .unwrap();
        assert!(spec.params.is_empty());
        let params: PathParams = spec.params_as().unwrap();
        assert_eq!(params.path, "/inline.json");
    }

    #[test]
    fn test_deserialize_with_legacy_kind() {
        let spec: DataSourceSpec = serde_json::from_str(
            r#"{"name": "api", "type": "api_endpoint", "interval": 30,
                "params": {"url": "http://localhost:9000/metrics"}}"#,
        )
        .unwrap();

        assert_eq!(spec.kind, SourceKind::HttpEndpoint);
        assert_eq!(spec.interval, Duration::from_secs(30));
        assert!(spec.enabled);
        assert!(spec.timeout.is_none());
    }

    #[test]
    fn test_params_as() {
        let spec = DataSourceSpec::new("file", SourceKind::JsonFile, Duration::from_secs(1))
            .with_param("path", "/tmp/metrics.json");
        let params: PathParams = spec.params_as().unwrap();
        assert_eq!(params.path, "/tmp/metrics.json");

        let missing = DataSourceSpec::new("file", SourceKind::JsonFile, Duration::from_secs(1));
        assert!(matches!(
            missing.params_as::<PathParams>(),
            Err(crate::MonitorError::InvalidConfig(_))
        ));
    }
}
