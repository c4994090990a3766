use crate::ui;
use anyhow::Result;
use colored::Colorize;
use monitor_core::collectors;
use monitor_export::from_destination;
use monitor_runtime::{parse_config_from_file, MonitorConfig};
use std::path::PathBuf;

pub async fn execute(config_file: PathBuf) -> Result<()> {
    println!("{}", "=== Validating Configuration ===".bold().cyan());
    println!("File: {}", config_file.display());

    let config = match parse_config_from_file(&config_file).await {
        Ok(config) => config,
        Err(e) => {
            println!("\n{}", "✗ Configuration is invalid!".red().bold());
            println!("\nError: {:#}", e);
            return Err(e);
        }
    };

    let problems = build_check(&config);
    if !problems.is_empty() {
        println!("\n{}", "✗ Configuration is invalid!".red().bold());
        for problem in &problems {
            ui::print_error(problem);
        }
        return Err(anyhow::anyhow!("{} problem(s) found", problems.len()));
    }

    println!("\n{}", "✓ Configuration is valid!".green().bold());

    println!("\nData Sources: {}", config.sources.len());
    for source in &config.sources {
        println!("  {}", source.description());
        for rule in config.rules.iter().filter(|r| r.source == source.name) {
            println!("    {}", rule.description());
        }
    }

    println!("\nDestinations: {}", config.export.destinations.len());
    for destination in &config.export.destinations {
        println!("  {} ({})", destination.label(), destination.kind);
    }

    for warning in warnings(&config) {
        ui::print_warning(&warning);
    }

    Ok(())
}

/// Construct every enabled collector and exporter without starting them.
fn build_check(config: &MonitorConfig) -> Vec<String> {
    let mut problems = Vec::new();
    for source in config.enabled_sources() {
        if let Err(e) = collectors::for_source(source) {
            problems.push(e.to_string());
        }
    }
    for destination in config.export.destinations.iter().filter(|d| d.enabled) {
        if let Err(e) = from_destination(destination) {
            problems.push(e.to_string());
        }
    }
    problems
}

fn warnings(config: &MonitorConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    for source in config.sources.iter().filter(|s| !s.enabled) {
        warnings.push(format!("Source '{}' is disabled", source.name));
    }
    for rule in &config.rules {
        let owner_enabled = config
            .sources
            .iter()
            .any(|s| s.name == rule.source && s.enabled);
        if rule.enabled && !owner_enabled {
            warnings.push(format!(
                "{} will never run because its source is disabled",
                rule.description()
            ));
        }
    }
    if config.rules.iter().all(|r| !r.enabled) {
        warnings.push("No enabled threshold rules".to_string());
    }
    if config.export.enabled && config.export.destinations.iter().all(|d| !d.enabled) {
        warnings.push("Export is enabled but no destination is configured".to_string());
    }

    warnings
}
