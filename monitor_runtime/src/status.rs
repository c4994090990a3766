use monitor_core::HealthRegistry;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub sources: usize,
    pub healthy: usize,
    pub unhealthy: Vec<(String, String)>,
}

pub async fn summarize(health: &HealthRegistry) -> StatusSummary {
    let sources = health.len().await;
    let unhealthy = health.unhealthy().await;
    StatusSummary {
        sources,
        healthy: sources.saturating_sub(unhealthy.len()),
        unhealthy,
    }
}

/// Periodically log how many sources report and which of them are failing.
pub async fn run_status_reporter(
    health: HealthRegistry,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let summary = summarize(&health).await;
                info!(
                    sources = summary.sources,
                    healthy = summary.healthy,
                    "Monitoring {} data sources",
                    summary.sources
                );
                for (source, detail) in &summary.unhealthy {
                    error!(source = %source, "Data source {} error: {}", source, detail);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::MetricSample;

    #[tokio::test]
    async fn test_summarize() {
        let health = HealthRegistry::new();
        health
            .record_success("cpu", MetricSample::from_pairs([("cpu_percent", 12.0)]))
            .await;
        health.record_failure("api", "connection refused").await;

        let summary = summarize(&health).await;
        assert_eq!(summary.sources, 2);
        assert_eq!(summary.healthy, 1);
        assert_eq!(
            summary.unhealthy,
            vec![("api".to_string(), "connection refused".to_string())]
        );
    }

    #[tokio::test]
    async fn test_reporter_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_status_reporter(
            HealthRegistry::new(),
            Duration::from_millis(5),
            cancel.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
