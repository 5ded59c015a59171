//! gs-orchestrator: Run one operation across a group of SSH endpoints
//!
//! A [`Group`] fans a command, a file fetch or a file upload out to every
//! endpoint concurrently, each over its own fresh session, and collects one
//! [`EndpointResult`] per endpoint. Per-endpoint failures stay inside their
//! result.

pub mod executor;
pub mod gateway;
pub mod group;

pub use gateway::{CommandOutput, FileTransfer, Gateway, RemoteSession, SshGateway};
pub use group::Group;

pub use gs_core::{AliasRequest, BatchSummary, Credential, Endpoint, EndpointDefaults, EndpointResult, OperationError};
