use crate::CommandOutput;
use camino::Utf8Path;
use russh::ChannelMsg;
use russh::client::{Config, Handle, Handler};
use russh::keys::PrivateKeyWithHashAlg;
use russh_sftp::client::SftpSession;
use russh_sftp::client::error::Error as SftpError;
use russh_sftp::protocol::StatusCode;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Error, Debug)]
pub enum SshError {
    #[error(transparent)]
    Ssh(#[from] russh::Error),

    #[error("failed to load key: {0}")]
    Key(#[from] russh::keys::Error),

    #[error("public key authentication rejected for {0}")]
    AuthenticationRejected(String),

    #[error("sftp: {0}")]
    Sftp(#[from] SftpError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SshError {
    /// Whether the SFTP server reported that the path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Sftp(SftpError::Status(status)) if status.status_code == StatusCode::NoSuchFile
        )
    }
}

/// Accepts any host key, as clusters are reached by address from trusted config.
#[derive(Clone, Debug, Default)]
pub(crate) struct ClientHandler;

impl Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// An authenticated SSH connection, closed explicitly after each operation.
pub struct SshSession {
    handle: Handle<ClientHandler>,
}

impl SshSession {
    pub(crate) async fn open(
        config: Arc<Config>,
        address: &str,
        port: u16,
        username: &str,
        key_path: &Utf8Path,
    ) -> Result<Self, SshError> {
        let mut handle = russh::client::connect(config, (address, port), ClientHandler).await?;
        let key = russh::keys::load_secret_key(key_path, None)?;
        let key = PrivateKeyWithHashAlg::new(
            Arc::new(key),
            handle.best_supported_rsa_hash().await?.flatten(),
        );
        let auth = handle.authenticate_publickey(username, key).await?;
        if !auth.success() {
            return Err(SshError::AuthenticationRejected(username.to_string()));
        }
        tracing::debug!("Connected to {}@{}:{}", username, address, port);
        Ok(Self { handle })
    }

    /// Run one command, collecting stdout and stderr until the channel closes.
    pub async fn exec(&self, command: &str) -> Result<CommandOutput, SshError> {
        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, command).await?;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status } if exit_status != 0 => {
                    tracing::debug!("'{}' exited with {}", command, exit_status);
                }
                ChannelMsg::Close => break,
                _ => {}
            }
        }
        Ok(CommandOutput::from_bytes(&stdout, &stderr))
    }

    async fn sftp(&self) -> Result<SftpSession, SshError> {
        let channel = self.handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        Ok(SftpSession::new(channel.into_stream()).await?)
    }

    pub async fn write_file(&self, path: &Utf8Path, content: &[u8]) -> Result<(), SshError> {
        let sftp = self.sftp().await?;
        let mut file = sftp.create(path.as_str()).await?;
        file.write_all(content).await?;
        file.shutdown().await?;
        let _ = sftp.close().await;
        Ok(())
    }

    pub async fn read_file(&self, path: &Utf8Path) -> Result<Vec<u8>, SshError> {
        let sftp = self.sftp().await?;
        let mut file = sftp.open(path.as_str()).await?;
        let mut content = Vec::new();
        file.read_to_end(&mut content).await?;
        let _ = sftp.close().await;
        Ok(content)
    }

    /// Modification time as seconds since the epoch.
    pub async fn modified_time(&self, path: &Utf8Path) -> Result<Option<u32>, SshError> {
        let sftp = self.sftp().await?;
        let attrs = sftp.metadata(path.as_str()).await?;
        let _ = sftp.close().await;
        Ok(attrs.mtime)
    }

    pub async fn close(self) {
        if let Err(e) = self
            .handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
        {
            tracing::debug!("Error while closing SSH session: {}", e);
        }
    }
}
