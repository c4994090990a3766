use crate::ui;
use anyhow::Result;
use colored::Colorize;
use monitor_core::{collectors, DataSourceSpec, MetricSample, MonitorError, ThresholdRule};
use monitor_runtime::{parse_config_from_file, MonitorConfig};
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

const MAX_VALUES_SHOWN: usize = 6;

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Values")]
    values: String,
    #[tabled(rename = "Breaching")]
    breaching: String,
}

pub async fn execute(config_file: PathBuf) -> Result<()> {
    println!("{}", "=== Checking Data Sources ===".bold().cyan());
    let config = parse_config_from_file(&config_file).await?;

    let mut rows = Vec::new();
    let mut failures = 0usize;

    for source in config.enabled_sources() {
        ui::print_info(&format!("Collecting {}", source.description()));
        let row = match collect_once(source, &config).await {
            Ok(sample) => CheckRow {
                source: source.name.clone(),
                kind: source.kind.to_string(),
                status: "ok".to_string(),
                values: preview(&sample),
                breaching: breaching(&config.rules_for(&source.name), &sample),
            },
            Err(e) => {
                failures += 1;
                CheckRow {
                    source: source.name.clone(),
                    kind: source.kind.to_string(),
                    status: "error".to_string(),
                    values: e.to_string(),
                    breaching: String::new(),
                }
            }
        };
        rows.push(row);
    }

    println!("\n{}", Table::new(rows).with(Style::rounded()));

    if failures > 0 {
        ui::print_error(&format!("{} source(s) failed", failures));
        return Err(anyhow::anyhow!("{} source(s) failed to collect", failures));
    }

    ui::print_success("All sources collected");
    Ok(())
}

async fn collect_once(
    source: &DataSourceSpec,
    config: &MonitorConfig,
) -> monitor_core::Result<MetricSample> {
    let mut collector = collectors::for_source(source)?;
    let timeout = source.timeout.unwrap_or(config.monitoring.collect_timeout);
    tokio::time::timeout(timeout, collector.collect())
        .await
        .map_err(|_| MonitorError::CollectionTimeout(timeout))?
}

fn preview(sample: &MetricSample) -> String {
    let mut shown: Vec<String> = sample
        .values
        .iter()
        .take(MAX_VALUES_SHOWN)
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    if sample.len() > MAX_VALUES_SHOWN {
        shown.push(format!("(+{} more)", sample.len() - MAX_VALUES_SHOWN));
    }
    shown.join("\n")
}

/// Rules whose comparison holds for this single sample, ignoring the
/// consecutive count.
fn breaching(rules: &[ThresholdRule], sample: &MetricSample) -> String {
    rules
        .iter()
        .filter(|rule| {
            sample
                .get(&rule.metric)
                .map_or(false, |value| rule.comparison.violates(value, rule.threshold))
        })
        .map(|rule| format!("{} {} {}", rule.metric, rule.comparison, rule.threshold))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::Comparison;

    #[test]
    fn test_preview_truncates() {
        let sample = MetricSample::from_pairs((0..8).map(|i| (format!("m{}", i), i as f64)));
        let text = preview(&sample);
        assert!(text.contains("m0=0"));
        assert!(text.ends_with("(+2 more)"));
    }

    #[test]
    fn test_breaching_ignores_missing_metrics() {
        let rules = vec![
            ThresholdRule::new("app", "load", Comparison::GreaterThan, 1.0),
            ThresholdRule::new("app", "absent", Comparison::GreaterThan, 1.0),
            ThresholdRule::new("app", "load", Comparison::LessThan, 1.0),
        ];
        let sample = MetricSample::from_pairs([("load", 3.0)]);
        assert_eq!(breaching(&rules, &sample), "load > 1");
    }
}
