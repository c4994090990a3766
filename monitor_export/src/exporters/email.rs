use crate::{destination::DestinationKind, exporters::Exporter};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use monitor_core::{MonitorError, Result, ViolationRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

fn default_smtp_port() -> u16 {
    587
}

fn default_starttls() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Sender address; defaults to `username`
    #[serde(default)]
    pub from: Option<String>,
    pub to_addresses: Vec<String>,
    #[serde(default = "default_starttls")]
    pub starttls: bool,
}

pub struct EmailExporter {
    name: String,
    from: Mailbox,
    to: Vec<Mailbox>,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

fn parse_mailbox(destination: &str, address: &str) -> Result<Mailbox> {
    address.parse().map_err(|e| {
        MonitorError::InvalidConfig(format!(
            "Invalid email address '{}' for destination '{}': {}",
            address, destination, e
        ))
    })
}

impl EmailExporter {
    pub fn new(name: impl Into<String>, config: EmailConfig) -> Result<Self> {
        let name = name.into();

        let sender = config
            .from
            .as_deref()
            .or(config.username.as_deref())
            .ok_or_else(|| {
                MonitorError::InvalidConfig(format!(
                    "Destination '{}' needs a 'from' address or a username",
                    name
                ))
            })?;
        let from = parse_mailbox(&name, sender)?;

        if config.to_addresses.is_empty() {
            return Err(MonitorError::InvalidConfig(format!(
                "Destination '{}' has no recipients",
                name
            )));
        }
        let to = config
            .to_addresses
            .iter()
            .map(|address| parse_mailbox(&name, address))
            .collect::<Result<Vec<_>>>()?;

        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server).map_err(
                |e| MonitorError::InvalidConfig(format!("SMTP relay '{}': {}", config.smtp_server, e)),
            )?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_server)
        }
        .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            name,
            from,
            to,
            mailer: builder.build(),
        })
    }
}

pub fn subject(record: &ViolationRecord) -> String {
    format!("Threshold Violation Alert - {}", record.source)
}

pub fn body(record: &ViolationRecord) -> String {
    let metadata = serde_json::to_string_pretty(&record.metadata)
        .unwrap_or_else(|e| format!("<unavailable: {}>", e));

    format!(
        r#"Threshold Violation Detected:

Data Source: {}
Metric: {}
Current Value: {}
Threshold: {} {}
Timestamp: {}
Violation ID: {}

Metadata: {}
"#,
        record.source,
        record.metric,
        record.value,
        record.comparison,
        record.threshold,
        record.timestamp.to_rfc3339(),
        record.id,
        metadata,
    )
}

#[async_trait]
impl Exporter for EmailExporter {
    async fn export(&self, record: &ViolationRecord) -> Result<()> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject(record))
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }

        let message = builder
            .body(body(record))
            .map_err(|e| MonitorError::dispatch(&self.name, e))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| MonitorError::dispatch(&self.name, e))?;

        info!("Alert email for {} sent to {} recipient(s)", record.id, self.to.len());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DestinationKind {
        DestinationKind::Email
    }
}
