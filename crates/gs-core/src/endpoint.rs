//! Endpoint descriptors
//!
//! An [`Endpoint`] describes how to reach and authenticate to one remote
//! target. It is built once per group, either directly or through the alias
//! resolver, and only read afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::serde_utils::option_duration_secs;
use crate::error::ConfigError;

/// Standard secure-shell port
pub const DEFAULT_PORT: u16 = 22;

/// Login used when neither the caller nor the alias source names one
pub const DEFAULT_USER: &str = "root";

/// Defaults applied to fields a caller or alias source leaves out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointDefaults {
    /// Login identity
    pub user: String,

    /// SSH port
    pub port: u16,

    /// Dial deadline (None = wait as long as the OS does)
    #[serde(with = "option_duration_secs", skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<Duration>,
}

impl Default for EndpointDefaults {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: None,
        }
    }
}

/// How an endpoint authenticates
///
/// Key material wins over a password whenever both are available.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Password authentication (may be empty)
    Password(String),

    /// Public key authentication with a private key on local disk
    KeyFile {
        /// Path to the private key
        path: PathBuf,
        /// Passphrase protecting the key, if any
        passphrase: Option<String>,
    },
}

impl Default for Credential {
    fn default() -> Self {
        Credential::Password(String::new())
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Password(_) => f.write_str("Password(***)"),
            Credential::KeyFile { path, .. } => f.debug_struct("KeyFile").field("path", path).finish(),
        }
    }
}

/// One remote target to operate on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Resolved hostname or IP address
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Caller-facing alias, used for `{host}` in templated paths
    pub alias: Option<String>,
    /// Login identity
    pub user: String,
    /// Authentication material
    pub credential: Credential,
    /// Deadline for the dial step only
    pub timeout: Option<Duration>,
}

impl Endpoint {
    /// Create an endpoint with the built-in defaults (port 22, user root,
    /// empty password, no timeout)
    pub fn new(host: impl Into<String>) -> Self {
        Self::from_defaults(host, &EndpointDefaults::default())
    }

    /// Create an endpoint taking user, port and timeout from `defaults`
    pub fn from_defaults(host: impl Into<String>, defaults: &EndpointDefaults) -> Self {
        Self {
            host: host.into(),
            port: defaults.port,
            alias: None,
            user: defaults.user.clone(),
            credential: Credential::default(),
            timeout: defaults.connect_timeout,
        }
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the login identity
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the caller-facing alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Authenticate with a password, unless a key file is already set
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        if !matches!(self.credential, Credential::KeyFile { .. }) {
            self.credential = Credential::Password(password.into());
        }
        self
    }

    /// Authenticate with a private key file
    pub fn with_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential = Credential::KeyFile {
            path: path.into(),
            passphrase: None,
        };
        self
    }

    /// Set the dial deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `host:port` as handed to the transport
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Alias when present, otherwise the resolved host
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.host)
    }

    /// Check that address and login identity are non-empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint host is empty".to_string()));
        }
        if self.user.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "endpoint {} has an empty user",
                self.host
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.address())
    }
}

/// Parse a direct target of the form `[user@]host[:port]`
///
/// IPv6 literals must be bracketed when a port is given (`[::1]:2222`).
/// Missing parts are taken from `defaults`.
pub fn parse_target(target: &str, defaults: &EndpointDefaults) -> Result<Endpoint, ConfigError> {
    let target = target.trim();
    let (user, rest) = match target.rsplit_once('@') {
        Some((user, rest)) => (Some(user), rest),
        None => (None, target),
    };

    let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
        let (host, tail) = bracketed
            .split_once(']')
            .ok_or_else(|| ConfigError::Invalid(format!("unterminated '[' in target '{}'", target)))?;
        match tail.strip_prefix(':') {
            Some(port) => (host, Some(port)),
            None if tail.is_empty() => (host, None),
            None => {
                return Err(ConfigError::Invalid(format!(
                    "unexpected '{}' after address in target '{}'",
                    tail, target
                )))
            }
        }
    } else if rest.matches(':').count() == 1 {
        let (host, port) = rest.split_once(':').unwrap_or((rest, ""));
        (host, Some(port))
    } else {
        // Bare IPv6 literal or plain hostname
        (rest, None)
    };

    let mut endpoint = Endpoint::from_defaults(host, defaults);
    if let Some(user) = user {
        endpoint.user = user.to_string();
    }
    if let Some(port) = port {
        endpoint.port = port
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid port '{}' in target '{}'", port, target)))?;
    }

    endpoint.validate()?;
    Ok(endpoint)
}
