//! Alias to endpoint resolution

use std::path::Path;
use std::time::Duration;

use super::{AliasSource, SshConfig};
use crate::endpoint::{Credential, Endpoint, EndpointDefaults};
use crate::error::ConfigError;

/// An endpoint named by alias, with optional overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasRequest {
    /// Alias to look up
    pub alias: String,
    /// Password, used only when the source names no identity file
    pub password: Option<String>,
    /// Dial deadline, overriding the source and the defaults
    pub timeout: Option<Duration>,
}

impl AliasRequest {
    /// Request an alias with no overrides
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..Default::default()
        }
    }

    /// Set the password override
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the timeout override
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl From<&str> for AliasRequest {
    fn from(alias: &str) -> Self {
        Self::new(alias)
    }
}

/// Turns alias requests into endpoints using an [`AliasSource`]
pub struct AliasResolver<S> {
    source: S,
    defaults: EndpointDefaults,
}

impl<S: AliasSource> AliasResolver<S> {
    /// Create a resolver over an already-loaded source
    pub fn new(source: S, defaults: EndpointDefaults) -> Self {
        Self { source, defaults }
    }

    /// Resolve one alias
    ///
    /// The alias is kept on the endpoint; the host is the source's `HostName`
    /// (with `%h` expanded to the alias) or the alias itself.
    pub fn resolve(&self, request: &AliasRequest) -> Result<Endpoint, ConfigError> {
        let entry = self.source.lookup(&request.alias);

        let host = entry
            .host_name
            .map(|name| name.replace("%h", &request.alias))
            .unwrap_or_else(|| request.alias.clone());

        let credential = match entry.identity_file {
            Some(path) => Credential::KeyFile {
                path,
                passphrase: None,
            },
            None => Credential::Password(request.password.clone().unwrap_or_default()),
        };

        let endpoint = Endpoint {
            host,
            port: entry.port.unwrap_or(self.defaults.port),
            alias: Some(request.alias.clone()),
            user: entry.user.unwrap_or_else(|| self.defaults.user.clone()),
            credential,
            timeout: match (request.timeout, entry.connect_timeout) {
                (Some(timeout), _) => Some(timeout),
                (None, Some(timeout)) if timeout.is_zero() => None,
                (None, Some(timeout)) => Some(timeout),
                (None, None) => self.defaults.connect_timeout,
            },
        };

        endpoint.validate()?;
        tracing::debug!("Resolved alias '{}' to {}", request.alias, endpoint);
        Ok(endpoint)
    }

    /// Resolve every request, in order
    pub fn resolve_all(&self, requests: &[AliasRequest]) -> Result<Vec<Endpoint>, ConfigError> {
        requests.iter().map(|r| self.resolve(r)).collect()
    }
}

/// Load an `ssh_config` once and resolve every request against it
///
/// Fails as a whole if the file cannot be opened or parsed.
pub fn resolve_aliases(
    path: &Path,
    requests: &[AliasRequest],
    defaults: &EndpointDefaults,
) -> Result<Vec<Endpoint>, ConfigError> {
    let source = SshConfig::load(path)?;
    AliasResolver::new(source, defaults.clone()).resolve_all(requests)
}
