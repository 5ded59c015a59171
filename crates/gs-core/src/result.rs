//! Per-endpoint operation results

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::endpoint::Endpoint;
use crate::error::OperationError;

/// Outcome of one operation against one endpoint
///
/// `error` is set exactly when the operation did not complete. In that case
/// `stdout`/`stderr` hold whatever was captured before the failure and are
/// not authoritative.
#[derive(Debug)]
pub struct EndpointResult {
    /// Resolved host the operation ran against
    pub host: String,
    /// Resolved port
    pub port: u16,
    /// Caller-facing alias, if the endpoint has one
    pub alias: Option<String>,
    /// Captured standard output (or a transfer confirmation)
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Remote exit status, for commands that reported one
    pub exit_status: Option<u32>,
    /// Failure, if the operation did not complete
    pub error: Option<OperationError>,
}

impl EndpointResult {
    /// A completed operation
    pub fn success(endpoint: &Endpoint, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            host: endpoint.host.clone(),
            port: endpoint.port,
            alias: endpoint.alias.clone(),
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_status: None,
            error: None,
        }
    }

    /// A failed operation with no captured output
    pub fn failure(endpoint: &Endpoint, error: OperationError) -> Self {
        Self {
            host: endpoint.host.clone(),
            port: endpoint.port,
            alias: endpoint.alias.clone(),
            stdout: String::new(),
            stderr: String::new(),
            exit_status: None,
            error: Some(error),
        }
    }

    /// Attach the remote exit status
    pub fn with_exit_status(mut self, exit_status: Option<u32>) -> Self {
        self.exit_status = exit_status;
        self
    }

    /// Whether the operation completed
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Alias when present, otherwise the resolved host
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.host)
    }

    /// Convert into a `Result` carrying stdout on success
    pub fn into_result(self) -> Result<String, OperationError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.stdout),
        }
    }
}

impl Serialize for EndpointResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("EndpointResult", 7)?;
        state.serialize_field("host", &self.host)?;
        state.serialize_field("port", &self.port)?;
        state.serialize_field("alias", &self.alias)?;
        state.serialize_field("stdout", &self.stdout)?;
        state.serialize_field("stderr", &self.stderr)?;
        state.serialize_field("exit_status", &self.exit_status)?;
        state.serialize_field("error", &self.error.as_ref().map(|e| e.to_string()))?;
        state.end()
    }
}

/// Success/failure counts for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Number of results in the batch
    pub total: usize,
    /// Results without an error
    pub succeeded: usize,
    /// Results with an error
    pub failed: usize,
}

impl BatchSummary {
    /// Count the outcomes of a batch
    pub fn of(results: &[EndpointResult]) -> Self {
        let failed = results.iter().filter(|r| !r.is_success()).count();
        Self {
            total: results.len(),
            succeeded: results.len() - failed,
            failed,
        }
    }

    /// Whether every endpoint succeeded
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
