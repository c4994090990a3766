use crate::ui;
use anyhow::Result;
use colored::Colorize;
use metrics_exporter_prometheus::PrometheusBuilder;
use monitor_runtime::{describe_metrics, MonitorConfig, ShutdownReport, Supervisor};
use std::net::SocketAddr;
use tracing::info;

pub async fn execute(config: MonitorConfig, prometheus_port: Option<u16>) -> Result<()> {
    println!("{}", "=== Threshold Monitor ===".bold().cyan());

    println!("\n{}", "Configuration:".bold());
    for source in &config.sources {
        let state = if source.enabled {
            "enabled".green()
        } else {
            "disabled".dimmed()
        };
        println!("  {} [{}]", source.description(), state);
    }
    println!("  Rules: {}", config.rules.iter().filter(|r| r.enabled).count());
    println!(
        "  Destinations: {}",
        config.export.destinations.iter().filter(|d| d.enabled).count()
    );

    if let Some(port) = prometheus_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;
        describe_metrics();
        info!("Metrics exporter started on http://{}/metrics", addr);
        println!("  Prometheus: http://{}/metrics", addr);
    }

    let handle = Supervisor::new(config).start()?;

    println!(
        "\n{}",
        "Monitoring started. Press Ctrl-C to stop.".bold().yellow()
    );

    tokio::signal::ctrl_c().await?;

    println!(
        "\n{} (grace period {})",
        "Stopping monitor...".bold(),
        humantime::format_duration(handle.grace_period())
    );
    let report = handle.shutdown().await;
    print_report(&report);

    Ok(())
}

fn print_report(report: &ShutdownReport) {
    ui::print_header("Shutdown Report");

    let mut names: Vec<_> = report.worker_stats.keys().collect();
    names.sort();
    for name in names {
        let stats = &report.worker_stats[name];
        println!(
            "  {} - cycles: {}, failures: {}, violations sent: {}, dropped: {}",
            name.yellow(),
            stats.cycles,
            stats.collection_failures,
            stats.violations_sent,
            stats.violations_dropped
        );
    }

    if let Some(export) = &report.export_stats {
        println!(
            "  {} - received: {}, delivered: {}, failed: {}",
            "export".yellow(),
            export.received,
            export.delivered,
            export.failed
        );
    }

    println!("  Elapsed: {}", humantime::format_duration(report.elapsed));

    if report.is_clean() {
        ui::print_success("All workers stopped gracefully");
    } else {
        ui::print_warning(&format!(
            "Force-terminated: {}",
            report.forced.join(", ")
        ));
    }
}
