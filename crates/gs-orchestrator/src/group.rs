//! Group fan-out/collect engine
//!
//! A [`Group`] owns a fixed list of endpoints. Each public operation spawns
//! one task per endpoint, waits for every task, and returns one result per
//! endpoint:
//!
//! ```text
//! Idle ──run/get/put──► Dispatching ──all spawned──► Collecting ──all joined──► Done
//! ```
//!
//! There is no early exit: a failing or slow endpoint never cancels or
//! alters the others. Results come back in endpoint order.

use std::path::Path;
use std::sync::Arc;

use tracing::Instrument;

use gs_core::alias::{resolve_aliases, AliasRequest};
use gs_core::{BatchSummary, ConfigError, Endpoint, EndpointDefaults, EndpointResult, OperationError};

use crate::executor;
use crate::gateway::{Gateway, SshGateway};

/// Endpoints that are operated on together
#[derive(Clone)]
pub struct Group {
    endpoints: Arc<[Endpoint]>,
    gateway: Arc<dyn Gateway>,
}

/// Operation applied to every endpoint of a batch
#[derive(Debug, Clone)]
enum Operation {
    Run { command: Arc<str> },
    Get { remote: Arc<str>, local_pattern: Arc<str> },
    Put { local: Arc<str>, remote: Arc<str> },
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Operation::Run { .. } => "run",
            Operation::Get { .. } => "get",
            Operation::Put { .. } => "put",
        }
    }

    async fn execute(&self, gateway: &dyn Gateway, endpoint: &Endpoint) -> EndpointResult {
        match self {
            Operation::Run { command } => executor::run_command(gateway, endpoint, command).await,
            Operation::Get { remote, local_pattern } => {
                executor::get_file(gateway, endpoint, remote, local_pattern).await
            }
            Operation::Put { local, remote } => executor::put_file(gateway, endpoint, local, remote).await,
        }
    }
}

impl Group {
    /// Create a group over explicit endpoints, using SSH
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self::with_gateway(endpoints, SshGateway::new())
    }

    /// Create a group over explicit endpoints with a custom gateway
    pub fn with_gateway(endpoints: Vec<Endpoint>, gateway: impl Gateway) -> Self {
        Self {
            endpoints: endpoints.into(),
            gateway: Arc::new(gateway),
        }
    }

    /// Create a group by resolving aliases against an ssh_config file, using SSH
    ///
    /// The file is read once. If it cannot be opened or parsed, no group is
    /// built and no endpoint is contacted.
    pub fn from_aliases(
        ssh_config: &Path,
        requests: &[AliasRequest],
        defaults: &EndpointDefaults,
    ) -> Result<Self, ConfigError> {
        Self::from_aliases_with_gateway(ssh_config, requests, defaults, SshGateway::new())
    }

    /// Like [`Group::from_aliases`], with a custom gateway
    pub fn from_aliases_with_gateway(
        ssh_config: &Path,
        requests: &[AliasRequest],
        defaults: &EndpointDefaults,
        gateway: impl Gateway,
    ) -> Result<Self, ConfigError> {
        let endpoints = resolve_aliases(ssh_config, requests, defaults)?;
        Ok(Self::with_gateway(endpoints, gateway))
    }

    /// Endpoints in this group
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Number of endpoints
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Check if the group has no endpoints
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Run a shell command on every endpoint
    pub async fn run(&self, command: &str) -> Vec<EndpointResult> {
        self.dispatch(Operation::Run {
            command: command.into(),
        })
        .await
    }

    /// Fetch `remote` from every endpoint
    ///
    /// `{host}` and `{port}` in `local_pattern` are replaced per endpoint.
    pub async fn get(&self, remote: &str, local_pattern: &str) -> Vec<EndpointResult> {
        self.dispatch(Operation::Get {
            remote: remote.into(),
            local_pattern: local_pattern.into(),
        })
        .await
    }

    /// Upload `local` to `remote` on every endpoint
    pub async fn put(&self, local: &str, remote: &str) -> Vec<EndpointResult> {
        self.dispatch(Operation::Put {
            local: local.into(),
            remote: remote.into(),
        })
        .await
    }

    async fn dispatch(&self, operation: Operation) -> Vec<EndpointResult> {
        let span = tracing::info_span!("batch", op = operation.name(), endpoints = self.endpoints.len());

        async {
            tracing::debug!("Dispatching");
            let handles: Vec<_> = self
                .endpoints
                .iter()
                .cloned()
                .map(|endpoint| {
                    let gateway = Arc::clone(&self.gateway);
                    let operation = operation.clone();
                    let span = tracing::debug_span!("endpoint", host = %endpoint.display_name());
                    tokio::spawn(
                        async move { operation.execute(&*gateway, &endpoint).await }.instrument(span),
                    )
                })
                .collect();

            tracing::debug!("Collecting {} results", handles.len());
            let joined = futures::future::join_all(handles).await;

            let results: Vec<EndpointResult> = joined
                .into_iter()
                .zip(self.endpoints.iter())
                .map(|(joined, endpoint)| {
                    joined.unwrap_or_else(|e| {
                        tracing::error!("Task for {} did not complete: {}", endpoint.display_name(), e);
                        EndpointResult::failure(endpoint, OperationError::Task(e.to_string()))
                    })
                })
                .collect();

            let summary = BatchSummary::of(&results);
            tracing::info!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Batch complete"
            );
            results
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group").field("endpoints", &self.endpoints).finish()
    }
}
