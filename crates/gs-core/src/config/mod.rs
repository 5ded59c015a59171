//! Configuration management for group-ssh

pub mod serde_utils;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::alias::default_ssh_config_path;
use crate::endpoint::EndpointDefaults;
use crate::error::ConfigError;

/// Persistent settings for the `group-ssh` tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// ssh_config file used to resolve aliases
    pub ssh_config_path: PathBuf,

    /// How results are printed
    pub output: OutputFormat,

    /// Defaults for endpoints that leave fields out
    pub defaults: EndpointDefaults,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            ssh_config_path: default_ssh_config_path(),
            output: OutputFormat::Text,
            defaults: EndpointDefaults::default(),
        }
    }
}

/// Result rendering style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One block per endpoint
    #[default]
    Text,
    /// Summary table
    Table,
    /// JSON array of results
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::Invalid(format!("unknown output format '{}'", other))),
        }
    }
}

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("group-ssh")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a file
pub fn save_config<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::Invalid(format!("Failed to create config dir: {}", e)))?;
    }

    std::fs::write(path, content)
        .map_err(|e| ConfigError::Invalid(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Load the tool configuration
///
/// An explicit path must exist. Without one, the default file is used when
/// present and built-in defaults otherwise.
pub fn load_group_config(explicit: Option<&Path>) -> Result<GroupConfig, ConfigError> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                load_config(&path)
            } else {
                tracing::debug!("No config at {:?}, using defaults", path);
                Ok(GroupConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = GroupConfig {
            ssh_config_path: PathBuf::from("/etc/ssh/ssh_config"),
            defaults: EndpointDefaults {
                user: "ops".to_string(),
                port: 2222,
                connect_timeout: Some(Duration::from_secs(10)),
            },
            output: OutputFormat::Json,
        };
        save_config(&path, &config).unwrap();

        let loaded: GroupConfig = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[defaults]\nuser = \"ubuntu\"\n").unwrap();

        let loaded: GroupConfig = load_config(&path).unwrap();
        assert_eq!(loaded.defaults.user, "ubuntu");
        assert_eq!(loaded.defaults.port, 22);
        assert_eq!(loaded.defaults.connect_timeout, None);
        assert_eq!(loaded.output, OutputFormat::Text);
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_group_config(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "defaults = [").unwrap();
        assert!(matches!(load_config::<GroupConfig>(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
