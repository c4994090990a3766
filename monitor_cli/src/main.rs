mod commands;
mod logging;
mod ui;

use clap::{Parser, Subcommand};
use logging::Verbosity;
use monitor_runtime::{parse_config_from_file, LoggingSettings};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "monitor")]
#[command(about = "Threshold monitor for system, HTTP and file based metrics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,
}

impl Cli {
    fn verbosity(&self) -> Verbosity {
        if self.verbose {
            Verbosity::Verbose
        } else if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring until interrupted
    Run {
        /// Path to configuration file (YAML, TOML, or JSON)
        config_file: PathBuf,

        /// Expose Prometheus metrics on port
        #[arg(short, long)]
        prometheus_port: Option<u16>,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        config_file: PathBuf,
    },

    /// Collect every enabled source once and print the values
    Check {
        /// Path to configuration file
        config_file: PathBuf,
    },

    /// List supported source kinds, destinations and comparisons
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();

    match cli.command {
        Commands::Run {
            config_file,
            prometheus_port,
        } => {
            let config = parse_config_from_file(&config_file).await?;
            let _guard = logging::init(verbosity, &config.logging)?;
            commands::run::execute(config, prometheus_port).await?;
        }

        Commands::Validate { config_file } => {
            let _guard = logging::init(verbosity, &LoggingSettings::default())?;
            commands::validate::execute(config_file).await?;
        }

        Commands::Check { config_file } => {
            let _guard = logging::init(verbosity, &LoggingSettings::default())?;
            commands::check::execute(config_file).await?;
        }

        Commands::List => {
            commands::list::execute().await?;
        }
    }

    Ok(())
}
