//! Target selection shared by run, get and put

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use gs_core::alias::{resolve_aliases, AliasRequest};
use gs_core::config::GroupConfig;
use gs_core::{parse_target, Endpoint};

/// Which hosts to operate on and how to log in
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Hosts as [user@]host[:port], or ssh_config aliases with --alias
    /// (repeatable, comma-separated lists accepted)
    #[arg(short = 'H', long = "host", value_name = "TARGET", value_delimiter = ',', required = true)]
    pub hosts: Vec<String>,

    /// Resolve hosts as aliases from an ssh_config file
    #[arg(short = 'A', long)]
    pub alias: bool,

    /// ssh_config file for --alias (default from config, usually ~/.ssh/config)
    #[arg(short = 'F', long, value_name = "PATH")]
    pub ssh_config: Option<PathBuf>,

    /// Login user when a target names none
    #[arg(short, long)]
    pub user: Option<String>,

    /// Port when a target names none
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Private key file (takes precedence over any password)
    #[arg(short, long, value_name = "PATH")]
    pub identity: Option<PathBuf>,

    /// Read the password from this environment variable
    #[arg(long, value_name = "VAR")]
    pub password_env: Option<String>,

    /// Connection timeout in seconds (0 = none)
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Build the endpoint list for a command
///
/// In alias mode the ssh_config is read once up front; if it cannot be
/// loaded nothing is returned and no host is contacted.
pub fn resolve_endpoints(args: &TargetArgs, config: &GroupConfig) -> Result<Vec<Endpoint>> {
    let mut defaults = config.defaults.clone();
    if let Some(user) = &args.user {
        defaults.user = user.clone();
    }
    if let Some(port) = args.port {
        defaults.port = port;
    }
    if let Some(secs) = args.timeout {
        defaults.connect_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let password = match &args.password_env {
        Some(var) => Some(
            std::env::var(var).with_context(|| format!("Environment variable {} is not set", var))?,
        ),
        None => None,
    };

    let hosts: Vec<&str> = args
        .hosts
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .collect();
    if hosts.is_empty() {
        anyhow::bail!("No hosts given");
    }

    let endpoints = if args.alias {
        let path = args
            .ssh_config
            .clone()
            .unwrap_or_else(|| config.ssh_config_path.clone());

        let requests: Vec<AliasRequest> = hosts
            .iter()
            .map(|alias| AliasRequest {
                alias: alias.to_string(),
                password: password.clone(),
                timeout: None,
            })
            .collect();

        resolve_aliases(&path, &requests, &defaults)
            .with_context(|| format!("Failed to resolve aliases from {}", path.display()))?
    } else {
        hosts
            .iter()
            .map(|target| {
                let endpoint = parse_target(target, &defaults)?;
                Ok(match &password {
                    Some(password) => endpoint.with_password(password.clone()),
                    None => endpoint,
                })
            })
            .collect::<Result<Vec<_>, gs_core::ConfigError>>()
            .context("Invalid host")?
    };

    let endpoints = match &args.identity {
        Some(identity) => endpoints
            .into_iter()
            .map(|endpoint| endpoint.with_key_file(identity.clone()))
            .collect(),
        None => endpoints,
    };

    tracing::debug!("Targeting {} endpoints", endpoints.len());
    Ok(endpoints)
}
