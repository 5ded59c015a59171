//! gs-core: Core types, alias resolution and configuration for group-ssh
//!
//! This crate provides the endpoint descriptor, the per-endpoint result
//! value, the error taxonomy and the `ssh_config` alias resolver shared by
//! the orchestrator and the CLI.

pub mod alias;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod result;
pub mod template;

pub use alias::{AliasRequest, AliasResolver, AliasSource, HostEntry, SshConfig};
pub use endpoint::{parse_target, Credential, Endpoint, EndpointDefaults};
pub use error::{ConfigError, GsError, OperationError};
pub use result::{BatchSummary, EndpointResult};
