use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::classify::OutputFormat;

#[derive(Parser)]
#[command(name = "mapagent")]
#[command(about = "Map agent session tools", long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a saved pipeline diagnostic log into a structured trace
    Classify {
        /// Log file with one diagnostic line per line
        log_file: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Overrides the configured assistant speaker name
        #[arg(long)]
        assistant_name: Option<String>,

        /// Overrides the configured proxy speaker name
        #[arg(long)]
        proxy_name: Option<String>,
    },
    /// Inspect or create the session config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storage = commands::config::storage(cli.config)?;

    match cli.command {
        Commands::Classify {
            log_file,
            format,
            assistant_name,
            proxy_name,
        } => {
            let mut config = storage.load_or_default()?;
            if let Some(name) = assistant_name {
                config.assistant_name = name;
            }
            if let Some(name) = proxy_name {
                config.proxy_name = name;
            }
            commands::classify::run(&log_file, &config, format)?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&storage)?,
            ConfigAction::Init { force } => commands::config::init(&storage, force)?,
        },
    }

    Ok(())
}
