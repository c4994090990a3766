use anyhow::Result;
use colored::Colorize;
use monitor_core::{collectors, Comparison};

pub async fn execute() -> Result<()> {
    println!("{}", "=== Supported Sources ===".bold().cyan());
    for kind in collectors::supported_kinds() {
        println!("  {} {}", "•".green(), kind);
    }
    println!("\n  system_metric metrics: cpu, memory, disk, network");

    println!("\n{}", "=== Supported Destinations ===".bold().cyan());
    for kind in monitor_export::supported_kinds() {
        println!("  {} {}", "•".green(), kind);
    }

    println!("\n{}", "=== Comparisons ===".bold().cyan());
    for comparison in Comparison::ALL {
        let name = serde_json::to_value(comparison)?;
        println!(
            "  {} {} ({})",
            "•".green(),
            name.as_str().unwrap_or_default(),
            comparison
        );
    }

    println!(
        "\n{}",
        "Use 'monitor check <config>' to sample each source once".yellow()
    );

    Ok(())
}
