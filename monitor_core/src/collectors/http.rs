use crate::{
    collectors::Collector,
    error::{MonitorError, Result},
    sample::MetricSample,
    source::SourceKind,
};
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

fn default_method() -> String {
    "GET".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpEndpointConfig {
    #[serde(alias = "source")]
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Fetches a JSON document and keeps its numeric leaves as metrics.
pub struct HttpEndpointCollector {
    name: String,
    config: HttpEndpointConfig,
    method: Method,
    client: reqwest::Client,
}

impl HttpEndpointCollector {
    pub fn new(name: impl Into<String>, config: HttpEndpointConfig) -> Result<Self> {
        let name = name.into();
        let method = Method::from_bytes(config.method.to_uppercase().as_bytes()).map_err(|e| {
            MonitorError::InvalidConfig(format!(
                "Invalid HTTP method '{}' for source '{}': {}",
                config.method, name, e
            ))
        })?;

        let url = reqwest::Url::parse(&config.url).map_err(|e| {
            MonitorError::InvalidConfig(format!(
                "Invalid URL '{}' for source '{}': {}",
                config.url, name, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MonitorError::InvalidConfig(format!(
                "Unsupported URL scheme '{}' for source '{}'",
                url.scheme(),
                name
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("threshold-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            name,
            config,
            method,
            client,
        })
    }
}

#[async_trait]
impl Collector for HttpEndpointCollector {
    async fn collect(&mut self) -> Result<MetricSample> {
        let mut request = self.client.request(self.method.clone(), &self.config.url);
        for (key, value) in &self.config.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await?.error_for_status()?;
        let body: serde_json::Value = response.json().await.map_err(|e| {
            MonitorError::MalformedPayload(format!("{} returned invalid JSON: {}", self.config.url, e))
        })?;

        let values = MetricSample::flatten_json(&body);
        if values.is_empty() {
            return Err(MonitorError::MalformedPayload(format!(
                "{} returned no numeric values",
                self.config.url
            )));
        }

        debug!(source = %self.name, count = values.len(), "Collected endpoint metrics");
        Ok(MetricSample::new(values))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::HttpEndpoint
    }
}
