#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scope_locks::ScopedLockManager;
use setting_options::{HyperFetch, SettingOptionsStore};

use crate::config::AppConfig;
use crate::logging::LogFormat;

/// Read and update remote settings groups
#[derive(Parser)]
#[command(name = "setting-options")]
#[command(version, about)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API origin override (overrides config and environment)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (overrides config)
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List settings groups
    Groups,
    /// List the settings of a group
    List { group: String },
    /// Print one setting's value as JSON
    Get { group: String, setting: String },
    /// Edit and save one setting; the value is parsed as JSON, falling back to text
    Set {
        group: String,
        setting: String,
        value: String,
    },
    /// Edit and save several settings of a group in one batch
    Batch {
        group: String,
        /// `<id>=<value>` pairs
        #[arg(required = true)]
        assignments: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.base_url.as_deref());
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    logging::init_logging(&config.logging, cli.verbose)?;

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }
    let Some(command) = cli.command else {
        anyhow::bail!("no command given, see --help");
    };

    let store = SettingOptionsStore::new(
        &config.api,
        Arc::new(HyperFetch::new(&config.api)?),
        Arc::new(ScopedLockManager::new()),
    );
    tracing::debug!(base_url = %config.api.base_url, "store ready");

    let mut out = std::io::stdout().lock();
    match command {
        Commands::Groups => commands::groups(&store, &mut out).await,
        Commands::List { group } => commands::list(&store, &group, &mut out).await,
        Commands::Get { group, setting } => {
            commands::get(&store, &group, &setting, &mut out).await
        }
        Commands::Set {
            group,
            setting,
            value,
        } => commands::set(&store, &group, &setting, &value, &mut out).await,
        Commands::Batch { group, assignments } => {
            commands::batch(&store, &group, &assignments, &mut out).await
        }
    }
}
