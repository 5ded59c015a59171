//! OpenSSH `ssh_config` alias source
//!
//! Parsing and `Host` matching are done by `ssh2-config`, including
//! `Include` directives and `!` patterns. The file is parsed once; lookups
//! are pure queries against the parsed tree, with OpenSSH's first value wins
//! rule across matching blocks.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ssh2_config::{HostParams, ParseRule};

use super::{AliasSource, HostEntry};
use crate::error::ConfigError;

/// Keywords outside what group-ssh reads are accepted and ignored
fn parse_rules() -> ParseRule {
    ParseRule::ALLOW_UNKNOWN_FIELDS | ParseRule::ALLOW_UNSUPPORTED_FIELDS
}

/// Parsed `ssh_config` file
#[derive(Debug)]
pub struct SshConfig {
    inner: ssh2_config::SshConfig,
}

impl SshConfig {
    /// Read and parse an `ssh_config` file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let inner = ssh2_config::SshConfig::default()
            .parse(&mut reader, parse_rules())
            .map_err(|e| ConfigError::SshConfig(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Loaded ssh_config from {}", path.display());
        Ok(Self { inner })
    }

    /// Parse `ssh_config` text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let inner = ssh2_config::SshConfig::default()
            .parse(&mut content.as_bytes(), parse_rules())
            .map_err(|e| ConfigError::SshConfig(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl AliasSource for SshConfig {
    fn lookup(&self, alias: &str) -> HostEntry {
        host_entry(self.inner.query(alias))
    }
}

fn host_entry(params: HostParams) -> HostEntry {
    HostEntry {
        host_name: params.host_name,
        user: params.user,
        port: params.port,
        identity_file: params
            .identity_file
            .and_then(|files| files.into_iter().next())
            .map(expand_tilde),
        connect_timeout: params.connect_timeout,
    }
}

/// Path of the current user's `ssh_config`
pub fn default_ssh_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ssh")
        .join("config")
}

fn expand_tilde(path: PathBuf) -> PathBuf {
    if let (Ok(rest), Some(home)) = (path.strip_prefix("~"), dirs::home_dir()) {
        return home.join(rest);
    }
    path
}
