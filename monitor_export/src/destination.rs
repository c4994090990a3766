use monitor_core::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    File,
    Webhook,
    Email,
    Log,
}

impl DestinationKind {
    pub const ALL: [DestinationKind; 4] = [
        DestinationKind::File,
        DestinationKind::Webhook,
        DestinationKind::Email,
        DestinationKind::Log,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationKind::File => "file",
            DestinationKind::Webhook => "webhook",
            DestinationKind::Email => "email",
            DestinationKind::Log => "log",
        }
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_enabled() -> bool {
    true
}

/// One configured export destination.
///
/// Kind-specific settings may be given either nested under `params` or
/// inline next to `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DestinationConfig {
    #[serde(rename = "type")]
    pub kind: DestinationKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
    #[serde(flatten)]
    pub inline: HashMap<String, serde_json::Value>,
}

impl DestinationConfig {
    pub fn new(kind: DestinationKind) -> Self {
        Self {
            kind,
            name: None,
            enabled: true,
            params: HashMap::new(),
            inline: HashMap::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.kind.to_string())
    }

    /// Decode the merged inline and nested params; nested keys win.
    pub fn params_as<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let mut merged = serde_json::Map::new();
        for (key, value) in self.inline.iter().chain(self.params.iter()) {
            merged.insert(key.clone(), value.clone());
        }

        serde_json::from_value(serde_json::Value::Object(merged)).map_err(|e| {
            MonitorError::InvalidConfig(format!(
                "Invalid params for destination '{}': {}",
                self.label(),
                e
            ))
        })
    }
}
