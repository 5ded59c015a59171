//! Core error types for group-ssh

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the group-ssh ecosystem
#[derive(Error, Debug)]
pub enum GsError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Operation error on a single endpoint
    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
///
/// Raised before any endpoint is contacted. A failure to load the alias
/// source aborts the whole group.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Config file exists but could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// ssh_config source rejected by the parser
    #[error("Invalid ssh_config: {0}")]
    SshConfig(String),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Failure of one operation against one endpoint
///
/// Always captured into that endpoint's result; never propagated to sibling
/// endpoints or to the caller's control flow.
#[derive(Error, Debug)]
pub enum OperationError {
    /// Private key could not be read or parsed
    #[error("Failed to load private key {}: {message}", .path.display())]
    Credential { path: PathBuf, message: String },

    /// TCP connect or SSH handshake failed
    #[error("Failed to connect to {address}: {message}")]
    Connect { address: String, message: String },

    /// Dial deadline elapsed
    #[error("Connection timed out: {address} did not answer within {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },

    /// Server refused the credential
    #[error("Authentication rejected for user '{user}'")]
    AuthRejected { user: String },

    /// Channel or subsystem could not be opened
    #[error("Session error: {0}")]
    Session(String),

    /// Local file could not be opened or created
    #[error("Local file {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote file could not be opened or created
    #[error("Remote file {path}: {message}")]
    Remote { path: String, message: String },

    /// Remote command exited with a non-zero status
    #[error("Command exited with status {exit_status}")]
    CommandFailed { exit_status: u32 },

    /// Channel closed before the remote command reported an exit status
    #[error("Command ended without an exit status")]
    CommandIncomplete,

    /// I/O error while copying bytes
    #[error("Transfer failed: {0}")]
    Transfer(#[source] std::io::Error),

    /// The endpoint's task did not run to completion
    #[error("Endpoint task failed: {0}")]
    Task(String),
}

impl OperationError {
    /// Whether this failure came from the dial deadline elapsing
    pub fn is_timeout(&self) -> bool {
        matches!(self, OperationError::ConnectTimeout { .. })
    }
}
