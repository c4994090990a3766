use crate::{destination::DestinationKind, exporters::Exporter};
use async_trait::async_trait;
use monitor_core::{MonitorError, Result, ViolationRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// POSTs each record as JSON.
pub struct WebhookExporter {
    name: String,
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookExporter {
    pub fn new(name: impl Into<String>, config: WebhookConfig) -> Result<Self> {
        let name = name.into();
        reqwest::Url::parse(&config.url).map_err(|e| {
            MonitorError::InvalidConfig(format!(
                "Invalid webhook URL '{}' for destination '{}': {}",
                config.url, name, e
            ))
        })?;

        Ok(Self {
            name,
            config,
            client: reqwest::Client::builder().build()?,
        })
    }
}

#[async_trait]
impl Exporter for WebhookExporter {
    async fn export(&self, record: &ViolationRecord) -> Result<()> {
        let mut request = self.client.post(&self.config.url).json(record);
        for (key, value) in &self.config.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| MonitorError::dispatch(&self.name, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::dispatch(
                &self.name,
                format!("{} responded with {}", self.config.url, status),
            ));
        }

        info!("Violation {} exported to webhook: {}", record.id, self.config.url);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DestinationKind {
        DestinationKind::Webhook
    }
}
