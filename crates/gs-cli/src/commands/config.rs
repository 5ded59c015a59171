//! Config command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::output::{print_error, print_info, print_success};
use gs_core::config::{self, GroupConfig};

fn config_file(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path)
}

/// Show the effective configuration
pub fn config_show(config_path: Option<&Path>) -> Result<()> {
    let path = config_file(config_path);
    let effective = config::load_group_config(config_path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;

    if path.exists() {
        print_info(&format!("Configuration file: {}", path.display()));
    } else {
        print_info(&format!("No configuration file at {}, showing defaults", path.display()));
    }
    println!();
    println!("{}", toml::to_string_pretty(&effective)?);

    Ok(())
}

/// Print the configuration file path
pub fn config_path(config_path: Option<&Path>) -> Result<()> {
    println!("{}", config_file(config_path).display());
    Ok(())
}

/// Write a default configuration file
pub fn config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_file(config_path);

    if path.exists() && !force {
        print_error(&format!("Config file already exists: {}", path.display()));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    config::save_config(&path, &GroupConfig::default())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    print_success(&format!("Created configuration file: {}", path.display()));
    Ok(())
}
