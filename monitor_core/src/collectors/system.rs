use crate::{
    collectors::{Collector, RateTracker},
    error::{MonitorError, Result},
    sample::MetricSample,
    source::SourceKind,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SystemMetric {
    #[serde(alias = "cpu_percent", alias = "psutil.cpu_percent")]
    Cpu,
    #[serde(alias = "virtual_memory", alias = "psutil.virtual_memory")]
    Memory,
    #[serde(alias = "disk_usage", alias = "psutil.disk_usage")]
    Disk,
    #[serde(alias = "net_io_counters", alias = "psutil.net_io_counters")]
    Network,
}

fn default_disk_path() -> PathBuf {
    PathBuf::from("/")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetricConfig {
    #[serde(alias = "source")]
    pub metric: SystemMetric,
    /// Mount point inspected by the disk metric
    #[serde(default = "default_disk_path")]
    pub path: PathBuf,
}

impl SystemMetricConfig {
    pub fn new(metric: SystemMetric) -> Self {
        Self {
            metric,
            path: default_disk_path(),
        }
    }
}

enum Reading {
    Values(BTreeMap<String, f64>),
    NetworkTotals { sent: u64, received: u64, at: Instant },
}

/// Host resource collector backed by `sysinfo`.
///
/// OS reads are blocking (the cpu reading sleeps between two refreshes), so
/// they run on the blocking pool and never stall sibling workers.
pub struct SystemMetricCollector {
    name: String,
    config: SystemMetricConfig,
    rates: RateTracker,
}

impl SystemMetricCollector {
    pub fn new(name: impl Into<String>, config: SystemMetricConfig) -> Self {
        Self {
            name: name.into(),
            config,
            rates: RateTracker::new(),
        }
    }

    fn network_values(&mut self, sent: u64, received: u64, at: Instant) -> BTreeMap<String, f64> {
        let sent = sent as f64;
        let received = received as f64;

        let mut values = BTreeMap::new();
        values.insert(
            "bytes_sent_per_sec".to_string(),
            self.rates.observe("bytes_sent", sent, at),
        );
        values.insert(
            "bytes_recv_per_sec".to_string(),
            self.rates.observe("bytes_recv", received, at),
        );
        values.insert("total_bytes_sent".to_string(), sent);
        values.insert("total_bytes_recv".to_string(), received);
        values
    }
}

#[async_trait]
impl Collector for SystemMetricCollector {
    async fn collect(&mut self) -> Result<MetricSample> {
        let metric = self.config.metric;
        let path = self.config.path.clone();

        let reading = tokio::task::spawn_blocking(move || read(metric, &path))
            .await
            .map_err(|e| MonitorError::Collection(format!("system reader failed: {}", e)))??;

        let values = match reading {
            Reading::Values(values) => values,
            Reading::NetworkTotals { sent, received, at } => self.network_values(sent, received, at),
        };

        debug!(source = %self.name, metric = ?metric, count = values.len(), "Collected system metrics");
        Ok(MetricSample::new(values))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::SystemMetric
    }
}

fn read(metric: SystemMetric, path: &Path) -> Result<Reading> {
    use sysinfo::{Disks, Networks, System};

    match metric {
        SystemMetric::Cpu => {
            let mut sys = System::new();
            sys.refresh_cpu();
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            sys.refresh_cpu();

            let mut values = BTreeMap::new();
            values.insert(
                "cpu_percent".to_string(),
                sys.global_cpu_info().cpu_usage() as f64,
            );
            Ok(Reading::Values(values))
        }
        SystemMetric::Memory => {
            let mut sys = System::new();
            sys.refresh_memory();

            let total = sys.total_memory();
            if total == 0 {
                return Err(MonitorError::Collection(
                    "total memory reported as zero".to_string(),
                ));
            }
            let used = sys.used_memory();

            let mut values = BTreeMap::new();
            values.insert(
                "memory_percent".to_string(),
                used as f64 / total as f64 * 100.0,
            );
            values.insert("memory_total".to_string(), total as f64);
            values.insert("memory_used".to_string(), used as f64);
            values.insert(
                "memory_available".to_string(),
                sys.available_memory() as f64,
            );
            Ok(Reading::Values(values))
        }
        SystemMetric::Disk => {
            let disks = Disks::new_with_refreshed_list();
            let disk = disks
                .list()
                .iter()
                .filter(|d| path.starts_with(d.mount_point()))
                .max_by_key(|d| d.mount_point().as_os_str().len())
                .ok_or_else(|| {
                    MonitorError::Collection(format!("no disk mounted at {}", path.display()))
                })?;

            let total = disk.total_space() as f64;
            if total == 0.0 {
                return Err(MonitorError::Collection(format!(
                    "disk at {} reports zero capacity",
                    path.display()
                )));
            }
            let free = disk.available_space() as f64;
            let used = total - free;

            let mut values = BTreeMap::new();
            values.insert("disk_percent".to_string(), used / total * 100.0);
            values.insert("disk_total_gb".to_string(), total / BYTES_PER_GB);
            values.insert("disk_used_gb".to_string(), used / BYTES_PER_GB);
            values.insert("disk_free_gb".to_string(), free / BYTES_PER_GB);
            Ok(Reading::Values(values))
        }
        SystemMetric::Network => {
            let networks = Networks::new_with_refreshed_list();
            let mut sent = 0u64;
            let mut received = 0u64;
            for (_interface, data) in &networks {
                sent = sent.saturating_add(data.total_transmitted());
                received = received.saturating_add(data.total_received());
            }

            Ok(Reading::NetworkTotals {
                sent,
                received,
                at: Instant::now(),
            })
        }
    }
}
