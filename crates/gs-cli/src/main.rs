//! group-ssh CLI
//!
//! Runs one operation across a group of SSH hosts at once:
//! - `run`: execute a shell command on every host
//! - `get`: fetch a remote file from every host
//! - `put`: upload a local file to every host

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use group_ssh::commands::{self, TargetArgs};
use gs_core::config::{self, GroupConfig, OutputFormat};
use gs_orchestrator::Group;

#[derive(Parser)]
#[command(name = "group-ssh")]
#[command(author, version, about = "Run commands and copy files across a group of SSH hosts")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Result format: text, table or json (overrides config)
    #[arg(long, global = true)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a shell command on every host
    Run {
        #[command(flatten)]
        targets: TargetArgs,
        /// Command line to execute
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Fetch a remote file from every host
    Get {
        #[command(flatten)]
        targets: TargetArgs,
        /// Remote file path
        remote: String,
        /// Local destination; {host} and {port} are replaced per host
        local: String,
    },

    /// Upload a local file to every host
    Put {
        #[command(flatten)]
        targets: TargetArgs,
        /// Local file path
        local: String,
        /// Remote destination path
        remote: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Show config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(config_path),
            ConfigAction::Path => commands::config_path(config_path),
            ConfigAction::Init { force } => commands::config_init(config_path, force),
        },
        Commands::Run { targets, command } => {
            let (group, format) = prepare(config_path, cli.format, &targets)?;
            commands::run_command(&group, &command.join(" "), format).await
        }
        Commands::Get { targets, remote, local } => {
            let (group, format) = prepare(config_path, cli.format, &targets)?;
            commands::get_command(&group, &remote, &local, format).await
        }
        Commands::Put { targets, local, remote } => {
            let (group, format) = prepare(config_path, cli.format, &targets)?;
            commands::put_command(&group, &local, &remote, format).await
        }
    }
}

/// Load config and build the group for a batch command
fn prepare(
    config_path: Option<&std::path::Path>,
    format: Option<OutputFormat>,
    targets: &TargetArgs,
) -> Result<(Group, OutputFormat)> {
    let settings: GroupConfig = config::load_group_config(config_path).context("Failed to load configuration")?;
    let endpoints = commands::resolve_endpoints(targets, &settings)?;
    Ok((Group::new(endpoints), format.unwrap_or(settings.output)))
}
