//! Alias resolution
//!
//! Callers may refer to endpoints by alias only. An [`AliasSource`] (usually
//! the user's `ssh_config`) supplies whatever connection details it knows,
//! and the [`AliasResolver`] fills the rest from [`EndpointDefaults`].
//!
//! [`EndpointDefaults`]: crate::endpoint::EndpointDefaults

mod resolver;
mod ssh_config;

pub use resolver::{resolve_aliases, AliasRequest, AliasResolver};
pub use ssh_config::{default_ssh_config_path, SshConfig};

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Connection details an alias source knows about one alias
///
/// Every field is optional; absent fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEntry {
    /// Real hostname or address (`HostName`)
    pub host_name: Option<String>,
    /// Login identity (`User`)
    pub user: Option<String>,
    /// Port (`Port`)
    pub port: Option<u16>,
    /// Private key path (`IdentityFile`)
    pub identity_file: Option<PathBuf>,
    /// Dial deadline (`ConnectTimeout`); zero means no deadline and still
    /// takes precedence over the defaults
    pub connect_timeout: Option<Duration>,
}

/// Lookup service keyed by alias
pub trait AliasSource {
    /// Details known for `alias`; unknown aliases yield an empty entry
    fn lookup(&self, alias: &str) -> HostEntry;
}

impl AliasSource for HashMap<String, HostEntry> {
    fn lookup(&self, alias: &str) -> HostEntry {
        self.get(alias).cloned().unwrap_or_default()
    }
}

impl<S: AliasSource + ?Sized> AliasSource for &S {
    fn lookup(&self, alias: &str) -> HostEntry {
        (**self).lookup(alias)
    }
}
