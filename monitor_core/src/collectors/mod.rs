pub mod file;
pub mod http;
pub mod rate;
pub mod system;

use crate::{error::Result, sample::MetricSample, source::DataSourceSpec, source::SourceKind};
use async_trait::async_trait;

pub use file::{JsonFileCollector, JsonFileConfig};
pub use http::{HttpEndpointCollector, HttpEndpointConfig};
pub use rate::RateTracker;
pub use system::{SystemMetric, SystemMetricCollector, SystemMetricConfig};

/// Pulls one sample from an external source on demand.
///
/// A collector is owned by exactly one source worker, which is why
/// `collect` takes `&mut self`: rate-style collectors keep the previous
/// cumulative reading between calls.
#[async_trait]
pub trait Collector: Send {
    /// Collect a fresh sample from the source
    async fn collect(&mut self) -> Result<MetricSample>;

    /// Name of the source this collector serves
    fn name(&self) -> &str;

    /// Source kind served by this collector
    fn kind(&self) -> SourceKind;
}

pub type DynCollector = Box<dyn Collector>;

/// Build the collector for a source, decoding and checking its params.
pub fn for_source(spec: &DataSourceSpec) -> Result<DynCollector> {
    let collector: DynCollector = match spec.kind {
        SourceKind::SystemMetric => {
            Box::new(SystemMetricCollector::new(&spec.name, spec.params_as()?))
        }
        SourceKind::HttpEndpoint => {
            Box::new(HttpEndpointCollector::new(&spec.name, spec.params_as()?)?)
        }
        SourceKind::JsonFile => Box::new(JsonFileCollector::new(&spec.name, spec.params_as()?)),
    };

    Ok(collector)
}

pub fn supported_kinds() -> Vec<String> {
    SourceKind::ALL.iter().map(|k| k.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use std::time::Duration;

    #[test]
    fn test_for_source_builds_each_kind() {
        let system = DataSourceSpec::new("cpu", SourceKind::SystemMetric, Duration::from_secs(5))
            .with_param("metric", "cpu");
        let http = DataSourceSpec::new("api", SourceKind::HttpEndpoint, Duration::from_secs(5))
            .with_param("url", "http://127.0.0.1:9100/metrics");
        let file = DataSourceSpec::new("file", SourceKind::JsonFile, Duration::from_secs(5))
            .with_param("path", "/tmp/metrics.json");

        for spec in [system, http, file] {
            let collector = for_source(&spec).unwrap();
            assert_eq!(collector.name(), spec.name);
            assert_eq!(collector.kind(), spec.kind);
        }
    }

    #[test]
    fn test_for_source_rejects_bad_params() {
        let spec = DataSourceSpec::new("cpu", SourceKind::SystemMetric, Duration::from_secs(5))
            .with_param("metric", "gpu");
        assert!(matches!(for_source(&spec), Err(MonitorError::InvalidConfig(_))));

        let spec = DataSourceSpec::new("api", SourceKind::HttpEndpoint, Duration::from_secs(5))
            .with_param("url", "http://127.0.0.1:9100")
            .with_param("method", "FETCH IT");
        assert!(matches!(for_source(&spec), Err(MonitorError::InvalidConfig(_))));
    }

    #[test]
    fn test_supported_kinds() {
        let kinds = supported_kinds();
        assert!(kinds.contains(&"system_metric".to_string()));
        assert!(kinds.contains(&"http_endpoint".to_string()));
        assert!(kinds.contains(&"json_file".to_string()));
    }
}
