use monitor_core::{DataSourceSpec, ThresholdRule};
use monitor_export::{DestinationConfig, DestinationKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Complete monitor configuration as loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(alias = "data_sources")]
    pub sources: Vec<DataSourceSpec>,
    #[serde(alias = "threshold_rules", default)]
    pub rules: Vec<ThresholdRule>,
    #[serde(alias = "export_settings", default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub monitoring: MonitoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(with = "monitor_core::duration", default = "default_dispatch_timeout")]
    pub dispatch_timeout: Duration,
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
    /// File export settings written at this level apply to every file
    /// destination that does not set them itself.
    #[serde(flatten)]
    pub shared: HashMap<String, serde_json::Value>,
}

/// File destination settings accepted at the export level, by field name and
/// legacy name.
const SHARED_FILE_KEYS: [(&str, &str); 4] = [
    ("directory", "export_directory"),
    ("formats", "export_formats"),
    ("max_files", "max_export_files"),
    ("compress", "compress_exports"),
];

impl ExportSettings {
    /// Copy shared file settings into each file destination that lacks them.
    pub fn apply_shared_defaults(&mut self) {
        for (field, legacy) in SHARED_FILE_KEYS {
            let Some(value) = self.shared.get(field).or_else(|| self.shared.get(legacy)) else {
                continue;
            };
            for destination in &mut self.destinations {
                if destination.kind != DestinationKind::File {
                    continue;
                }
                let set = [field, legacy].iter().any(|key| {
                    destination.params.contains_key(*key) || destination.inline.contains_key(*key)
                });
                if !set {
                    destination.inline.insert(field.to_string(), value.clone());
                }
            }
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            channel_capacity: default_channel_capacity(),
            dispatch_timeout: default_dispatch_timeout(),
            destinations: Vec::new(),
            shared: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSettings {
    #[serde(
        alias = "check_interval",
        with = "monitor_core::duration",
        default = "default_status_interval"
    )]
    pub status_interval: Duration,
    #[serde(with = "monitor_core::duration", default = "default_shutdown_grace")]
    pub shutdown_grace: Duration,
    #[serde(with = "monitor_core::duration", default = "default_collect_timeout")]
    pub collect_timeout: Duration,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            status_interval: default_status_interval(),
            shutdown_grace: default_shutdown_grace(),
            collect_timeout: default_collect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    1000
}

fn default_dispatch_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_status_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(5)
}

fn default_collect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl MonitorConfig {
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// Resolve settings that depend on other sections before validation.
    pub fn normalize(&mut self) {
        self.assign_rule_ids();
        self.export.apply_shared_defaults();
    }

    /// Number rules in configuration order; ids key the evaluator counters.
    pub fn assign_rule_ids(&mut self) {
        for (index, rule) in self.rules.iter_mut().enumerate() {
            rule.id = monitor_core::RuleId(index);
        }
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &DataSourceSpec> {
        self.sources.iter().filter(|s| s.enabled)
    }

    /// Enabled rules owned by `source`, in configuration order.
    pub fn rules_for(&self, source: &str) -> Vec<ThresholdRule> {
        self.rules
            .iter()
            .filter(|r| r.enabled && r.source == source)
            .cloned()
            .collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sources.is_empty() {
            return Err("At least one data source must be configured".to_string());
        }

        let mut names = HashSet::new();
        for (i, source) in self.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(format!("Source {} name cannot be empty", i));
            }
            if !names.insert(source.name.as_str()) {
                return Err(format!("Duplicate source name '{}'", source.name));
            }
            check_period(&format!("Source '{}' interval", source.name), source.interval)?;
            if let Some(timeout) = source.timeout {
                check_period(&format!("Source '{}' timeout", source.name), timeout)?;
            }
        }

        for rule in &self.rules {
            rule.validate()?;
            if !names.contains(rule.source.as_str()) {
                return Err(format!(
                    "{} references unknown source '{}'",
                    rule.id, rule.source
                ));
            }
        }

        if self.export.channel_capacity == 0 {
            return Err("Export channel capacity must be > 0".to_string());
        }
        check_period("Export dispatch timeout", self.export.dispatch_timeout)?;
        check_period("Status interval", self.monitoring.status_interval)?;
        check_period("Collect timeout", self.monitoring.collect_timeout)?;
        if Instant::now().checked_add(self.monitoring.shutdown_grace).is_none() {
            return Err("Shutdown grace period is too large".to_string());
        }

        Ok(())
    }
}

/// Periods must be non-zero and representable as a deadline from now.
fn check_period(label: &str, period: Duration) -> Result<(), String> {
    if period.is_zero() {
        return Err(format!("{} must be > 0", label));
    }
    if Instant::now().checked_add(period).is_none() {
        return Err(format!("{} is too large", label));
    }
    Ok(())
}

#[derive(Default)]
pub struct MonitorConfigBuilder {
    sources: Vec<DataSourceSpec>,
    rules: Vec<ThresholdRule>,
    export: ExportSettings,
    monitoring: MonitoringSettings,
    logging: LoggingSettings,
}

impl MonitorConfigBuilder {
    pub fn source(mut self, source: DataSourceSpec) -> Self {
        self.sources.push(source);
        self
    }

    pub fn rule(mut self, rule: ThresholdRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn destination(mut self, destination: DestinationConfig) -> Self {
        self.export.destinations.push(destination);
        self
    }

    pub fn export_enabled(mut self, enabled: bool) -> Self {
        self.export.enabled = enabled;
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.export.channel_capacity = capacity;
        self
    }

    pub fn dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.export.dispatch_timeout = timeout;
        self
    }

    pub fn status_interval(mut self, interval: Duration) -> Self {
        self.monitoring.status_interval = interval;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.monitoring.shutdown_grace = grace;
        self
    }

    pub fn collect_timeout(mut self, timeout: Duration) -> Self {
        self.monitoring.collect_timeout = timeout;
        self
    }

    pub fn logging(mut self, logging: LoggingSettings) -> Self {
        self.logging = logging;
        self
    }

    pub fn build(self) -> Result<MonitorConfig, String> {
        let mut config = MonitorConfig {
            sources: self.sources,
            rules: self.rules,
            export: self.export,
            monitoring: self.monitoring,
            logging: self.logging,
        };
        config.normalize();
        config.validate()?;
        Ok(config)
    }
}
