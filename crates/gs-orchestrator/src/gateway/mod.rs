//! Remote session gateway
//!
//! The narrow contract the executors need from an SSH transport: dial and
//! authenticate one endpoint, run a command on the session, or open a file
//! transfer channel on it. [`SshGateway`] implements it over russh; tests
//! substitute in-memory gateways.

mod ssh;

pub use ssh::SshGateway;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use gs_core::{Endpoint, OperationError};

/// Readable remote or local byte stream
pub type ByteSource = Box<dyn AsyncRead + Send + Unpin>;

/// Writable remote byte stream
pub type ByteSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Output of one remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Bytes written to standard output
    pub stdout: Vec<u8>,
    /// Bytes written to standard error
    pub stderr: Vec<u8>,
    /// Exit status, if the server reported one before closing the channel
    pub exit_status: Option<u32>,
}

/// Opens authenticated sessions to endpoints
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// Connect to and authenticate against `endpoint`
    ///
    /// The caller applies the endpoint's deadline around this call.
    async fn dial(&self, endpoint: &Endpoint) -> Result<Box<dyn RemoteSession>, OperationError>;
}

/// One authenticated session
#[async_trait]
pub trait RemoteSession: Send {
    /// Run `command` and wait for it to finish
    ///
    /// Output captured before the channel closed is returned even when no
    /// exit status arrived.
    async fn run_command(&mut self, command: &str) -> Result<CommandOutput, OperationError>;

    /// Open a file transfer channel on this session
    async fn open_transfer(&mut self) -> Result<Box<dyn FileTransfer>, OperationError>;

    /// Release the session
    async fn close(self: Box<Self>) -> Result<(), OperationError>;
}

/// File transfer channel on a session
#[async_trait]
pub trait FileTransfer: Send {
    /// Open a remote file for reading
    async fn open_read(&mut self, path: &str) -> Result<ByteSource, OperationError>;

    /// Create or truncate a remote file for writing
    async fn open_write(&mut self, path: &str) -> Result<ByteSink, OperationError>;

    /// Release the channel
    async fn close(self: Box<Self>) -> Result<(), OperationError>;
}
