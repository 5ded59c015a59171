//! russh-backed gateway
//!
//! Commands run on an `exec` channel; file transfers use the `sftp`
//! subsystem through russh-sftp.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Config, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::{KeyPair, PublicKey};
use russh_sftp::client::SftpSession;

use gs_core::{Credential, Endpoint, OperationError};

use super::{ByteSink, ByteSource, CommandOutput, FileTransfer, Gateway, RemoteSession};

/// Extended data stream carrying stderr
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// Gateway that opens a fresh russh connection per dial
pub struct SshGateway {
    config: Arc<Config>,
}

impl SshGateway {
    /// Create a gateway with russh's default client configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a gateway with a custom client configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for SshGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for SshGateway {
    async fn dial(&self, endpoint: &Endpoint) -> Result<Box<dyn RemoteSession>, OperationError> {
        // Parse key material before touching the network
        let auth = match &endpoint.credential {
            Credential::KeyFile { path, passphrase } => {
                Auth::Key(load_key(path, passphrase.as_deref())?)
            }
            Credential::Password(password) => Auth::Password(password.clone()),
        };

        let address = endpoint.address();
        tracing::debug!("Connecting to {}", address);

        let handler = ClientHandler::new(address.clone());
        let mut handle = client::connect(
            Arc::clone(&self.config),
            (endpoint.host.as_str(), endpoint.port),
            handler,
        )
        .await
        .map_err(|e| OperationError::Connect {
            address: address.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!("Authenticating to {} as user '{}'", address, endpoint.user);
        let authenticated = match auth {
            Auth::Key(key) => handle.authenticate_publickey(&endpoint.user, key).await,
            Auth::Password(password) => handle.authenticate_password(&endpoint.user, password).await,
        }
        .map_err(|e| OperationError::Connect {
            address: address.clone(),
            message: format!("Authentication error: {}", e),
        })?;

        if !authenticated {
            let _ = handle
                .disconnect(Disconnect::ByApplication, "authentication rejected", "en")
                .await;
            return Err(OperationError::AuthRejected {
                user: endpoint.user.clone(),
            });
        }

        tracing::debug!("Authenticated to {}", address);
        Ok(Box::new(SshSession { handle, address }))
    }
}

/// Loaded authentication material
enum Auth {
    Key(Arc<KeyPair>),
    Password(String),
}

fn load_key(path: &Path, passphrase: Option<&str>) -> Result<Arc<KeyPair>, OperationError> {
    if !path.exists() {
        return Err(OperationError::Credential {
            path: path.to_path_buf(),
            message: "File does not exist".to_string(),
        });
    }

    russh_keys::load_secret_key(path, passphrase)
        .map(Arc::new)
        .map_err(|e| OperationError::Credential {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// An authenticated russh connection
struct SshSession {
    handle: Handle<ClientHandler>,
    address: String,
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn run_command(&mut self, command: &str) -> Result<CommandOutput, OperationError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| OperationError::Session(format!("Failed to open session channel: {}", e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| OperationError::Session(format!("Failed to start command: {}", e)))?;

        let mut output = CommandOutput::default();
        // Keep reading after ExitStatus: data may still be in flight
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                    output.stderr.extend_from_slice(data)
                }
                ChannelMsg::ExitStatus { exit_status } => output.exit_status = Some(exit_status),
                _ => {}
            }
        }

        tracing::debug!(
            "Command on {} finished with status {:?}",
            self.address,
            output.exit_status
        );
        Ok(output)
    }

    async fn open_transfer(&mut self) -> Result<Box<dyn FileTransfer>, OperationError> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| OperationError::Session(format!("Failed to open session channel: {}", e)))?;

        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| OperationError::Session(format!("Failed to request sftp subsystem: {}", e)))?;

        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| OperationError::Session(format!("Failed to start sftp: {}", e)))?;

        Ok(Box::new(SftpTransfer { sftp }))
    }

    async fn close(self: Box<Self>) -> Result<(), OperationError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "closing", "en")
            .await
            .map_err(|e| OperationError::Session(format!("Failed to disconnect: {}", e)))
    }
}

/// sftp channel on an [`SshSession`]
struct SftpTransfer {
    sftp: SftpSession,
}

#[async_trait]
impl FileTransfer for SftpTransfer {
    async fn open_read(&mut self, path: &str) -> Result<ByteSource, OperationError> {
        let file = self.sftp.open(path).await.map_err(|e| OperationError::Remote {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Box::new(file))
    }

    async fn open_write(&mut self, path: &str) -> Result<ByteSink, OperationError> {
        let file = self.sftp.create(path).await.map_err(|e| OperationError::Remote {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Box::new(file))
    }

    async fn close(self: Box<Self>) -> Result<(), OperationError> {
        self.sftp
            .close()
            .await
            .map_err(|e| OperationError::Session(format!("Failed to close sftp: {}", e)))
    }
}

/// russh client handler
struct ClientHandler {
    /// Address being dialed, for logging
    address: String,
}

impl ClientHandler {
    fn new(address: String) -> Self {
        Self { address }
    }
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    /// Accept the server's host key
    ///
    /// Host keys are not pinned; the fingerprint is logged so it can be
    /// checked by hand.
    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        tracing::debug!(
            "Host key for {}: {}",
            self.address,
            server_public_key.fingerprint()
        );
        Ok(true)
    }
}
