//! Single-endpoint operation executors
//!
//! Every executor follows the same sequence: dial (under the endpoint's
//! deadline), perform the operation, release every channel and the session,
//! and fold the outcome into an [`EndpointResult`]. Executors never return
//! an error; failures live in the result.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use gs_core::template::render_local_path;
use gs_core::{Endpoint, EndpointResult, OperationError};

use crate::gateway::{FileTransfer, Gateway, RemoteSession};

/// Run `command` on one endpoint
///
/// A non-zero exit status or a missing one is a failure, but stdout/stderr
/// still carry whatever the command printed.
pub async fn run_command(gateway: &dyn Gateway, endpoint: &Endpoint, command: &str) -> EndpointResult {
    let mut session = match connect(gateway, endpoint).await {
        Ok(session) => session,
        Err(e) => return EndpointResult::failure(endpoint, e),
    };

    let outcome = session.run_command(command).await;
    release_session(session, endpoint).await;

    let output = match outcome {
        Ok(output) => output,
        Err(e) => return EndpointResult::failure(endpoint, e),
    };

    let mut result = EndpointResult::success(
        endpoint,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    )
    .with_exit_status(output.exit_status);

    result.error = match output.exit_status {
        Some(0) => None,
        Some(exit_status) => Some(OperationError::CommandFailed { exit_status }),
        None => Some(OperationError::CommandIncomplete),
    };
    result
}

/// Copy `remote` from one endpoint to a local path rendered from `local_pattern`
pub async fn get_file(
    gateway: &dyn Gateway,
    endpoint: &Endpoint,
    remote: &str,
    local_pattern: &str,
) -> EndpointResult {
    let local = PathBuf::from(render_local_path(local_pattern, endpoint));
    transfer(gateway, endpoint, Direction::Fetch { remote, local: &local }).await
}

/// Copy `local` to `remote` on one endpoint
pub async fn put_file(gateway: &dyn Gateway, endpoint: &Endpoint, local: &str, remote: &str) -> EndpointResult {
    transfer(
        gateway,
        endpoint,
        Direction::Upload {
            local: Path::new(local),
            remote,
        },
    )
    .await
}

/// Which way bytes flow for a transfer
#[derive(Debug, Clone, Copy)]
enum Direction<'a> {
    /// Remote file to local file
    Fetch { remote: &'a str, local: &'a Path },
    /// Local file to remote file
    Upload { local: &'a Path, remote: &'a str },
}

impl Direction<'_> {
    fn confirmation(&self) -> String {
        match self {
            Direction::Fetch { remote, local } => {
                format!("File {} processed to {}\n", remote, local.display())
            }
            Direction::Upload { local, remote } => {
                format!("File {} processed to {}\n", local.display(), remote)
            }
        }
    }
}

async fn transfer(gateway: &dyn Gateway, endpoint: &Endpoint, direction: Direction<'_>) -> EndpointResult {
    let mut session = match connect(gateway, endpoint).await {
        Ok(session) => session,
        Err(e) => return EndpointResult::failure(endpoint, e),
    };

    let outcome = match session.open_transfer().await {
        Ok(mut channel) => {
            let copied = copy(channel.as_mut(), direction).await;
            if let Err(e) = channel.close().await {
                tracing::warn!("Failed to close transfer channel to {}: {}", endpoint.display_name(), e);
            }
            copied
        }
        Err(e) => Err(e),
    };
    release_session(session, endpoint).await;

    match outcome {
        Ok(bytes) => {
            tracing::debug!("Transferred {} bytes with {}", bytes, endpoint.display_name());
            EndpointResult::success(endpoint, direction.confirmation(), "")
        }
        Err(e) => EndpointResult::failure(endpoint, e),
    }
}

/// Copy all bytes; both handles are dropped before returning
async fn copy(channel: &mut dyn FileTransfer, direction: Direction<'_>) -> Result<u64, OperationError> {
    match direction {
        Direction::Fetch { remote, local } => {
            let mut source = channel.open_read(remote).await?;
            let mut file = tokio::fs::File::create(local)
                .await
                .map_err(|source| OperationError::LocalIo {
                    path: local.to_path_buf(),
                    source,
                })?;

            let bytes = tokio::io::copy(&mut source, &mut file)
                .await
                .map_err(OperationError::Transfer)?;
            file.flush().await.map_err(OperationError::Transfer)?;
            Ok(bytes)
        }
        Direction::Upload { local, remote } => {
            let mut file = tokio::fs::File::open(local)
                .await
                .map_err(|source| OperationError::LocalIo {
                    path: local.to_path_buf(),
                    source,
                })?;
            let mut sink = channel.open_write(remote).await?;

            let bytes = tokio::io::copy(&mut file, &mut sink)
                .await
                .map_err(OperationError::Transfer)?;
            sink.shutdown().await.map_err(OperationError::Transfer)?;
            Ok(bytes)
        }
    }
}

/// Dial an endpoint, bounded by its deadline if it has one
async fn connect(gateway: &dyn Gateway, endpoint: &Endpoint) -> Result<Box<dyn RemoteSession>, OperationError> {
    tracing::debug!("Dialing {}", endpoint);

    match endpoint.timeout {
        Some(limit) => tokio::time::timeout(limit, gateway.dial(endpoint))
            .await
            .map_err(|_| OperationError::ConnectTimeout {
                address: endpoint.address(),
                timeout: limit,
            })?,
        None => gateway.dial(endpoint).await,
    }
}

async fn release_session(session: Box<dyn RemoteSession>, endpoint: &Endpoint) {
    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close session to {}: {}", endpoint.display_name(), e);
    }
}
