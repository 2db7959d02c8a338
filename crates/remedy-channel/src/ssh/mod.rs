//! SSH transport: commands over exec channels, files over SFTP.

mod session;

use crate::error::ChannelError;
use crate::retry::{ChannelPolicies, RetryExhausted, retry};
use crate::{CommandOutput, ExecutionChannel, UploadSource, content_lines};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use remedy_core::Target;
use std::future::Future;
use std::sync::Arc;

pub use session::{SshError, SshSession};

/// Channel to a remote target. Every operation opens a fresh session.
pub struct SshChannel {
    target: Arc<Target>,
    config: Arc<russh::client::Config>,
    key_path: Utf8PathBuf,
    policies: ChannelPolicies,
}

impl SshChannel {
    pub fn new(target: Arc<Target>, policies: ChannelPolicies) -> Self {
        let key_path = target.key.clone().unwrap_or_else(default_key_path);
        Self {
            target,
            config: Arc::new(russh::client::Config::default()),
            key_path,
            policies,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Open an authenticated session, retrying per the connect policy.
    pub async fn connect(&self) -> Result<SshSession, ChannelError> {
        let address = self.target.address.as_deref().unwrap_or_default();
        let what = format!("connection to {}", self.target.name);
        retry(&self.policies.connect, &what, |_| {
            SshSession::open(
                Arc::clone(&self.config),
                address,
                self.target.port,
                &self.target.username,
                &self.key_path,
            )
        })
        .await
        .map_err(|e| ChannelError::ConnectionExhausted {
            target: self.target.name.clone(),
            attempts: e.attempts,
            last_error: e.last_error.to_string(),
        })
    }

    fn transfer_failed(&self, path: &Utf8Path, attempts: u32, last_error: String) -> ChannelError {
        ChannelError::TransferFailed {
            target: self.target.name.clone(),
            path: path.to_owned(),
            attempts,
            last_error,
        }
    }

    /// Outcome of a transfer retry. Connection errors pass through untouched;
    /// only SFTP and file errors count against the transfer budget.
    fn transfer_outcome(
        &self,
        path: &Utf8Path,
        result: Result<Result<(), ChannelError>, RetryExhausted<String>>,
    ) -> Result<(), ChannelError> {
        match result {
            Ok(outcome) => outcome,
            Err(e) => Err(self.transfer_failed(path, e.attempts, e.last_error)),
        }
    }

    /// Missing files have no modification time; any other failure is a transport error.
    fn modification_time(
        &self,
        path: &Utf8Path,
        mtime: Result<Option<u32>, SshError>,
    ) -> Result<Option<DateTime<Utc>>, ChannelError> {
        match mtime {
            Ok(secs) => Ok(secs.and_then(|secs| DateTime::from_timestamp(i64::from(secs), 0))),
            Err(e) if e.is_not_found() => {
                tracing::debug!("{} does not exist on {}", path, self.target.name);
                Ok(None)
            }
            Err(e) => Err(self.transfer_failed(path, 1, e.to_string())),
        }
    }
}

/// Command line run on the remote side, from `working_dir` if given.
fn remote_command(command: &str, working_dir: Option<&Utf8Path>) -> String {
    match working_dir {
        Some(dir) => format!("cd {} && {}", dir, command),
        None => command.to_string(),
    }
}

/// Run `exec`, and once more if the first attempt fails in transport.
async fn exec_retrying_once<F, Fut>(
    target: &str,
    command: &str,
    mut exec: F,
) -> Result<CommandOutput, ChannelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<CommandOutput, SshError>>,
{
    let output = match exec().await {
        Ok(output) => Ok(output),
        Err(first) => {
            tracing::warn!(
                "Command '{}' on {} failed ({}), trying once more",
                command,
                target,
                first
            );
            exec().await
        }
    };
    output.map_err(|e| ChannelError::CommandTransport {
        target: target.to_string(),
        command: command.to_string(),
        error: e.to_string(),
    })
}

impl ExecutionChannel for SshChannel {
    async fn execute(
        &self,
        command: &str,
        working_dir: Option<&Utf8Path>,
    ) -> Result<CommandOutput, ChannelError> {
        let full_command = remote_command(command, working_dir);
        let session = self.connect().await?;
        let output = {
            let (session, full_command) = (&session, full_command.as_str());
            exec_retrying_once(&self.target.name, full_command, move || session.exec(full_command))
                .await
        };
        session.close().await;
        output
    }

    async fn upload(
        &self,
        remote_path: &Utf8Path,
        source: UploadSource<'_>,
    ) -> Result<(), ChannelError> {
        let content = match source {
            UploadSource::File(local) => {
                if !tokio::fs::try_exists(local).await.unwrap_or(false) {
                    return Err(ChannelError::MissingLocalFile(local.to_owned()));
                }
                tokio::fs::read(local)
                    .await
                    .map_err(|source| ChannelError::Io {
                        path: local.to_owned(),
                        source,
                    })?
            }
            UploadSource::Content(text) => text.as_bytes().to_vec(),
        };
        let what = format!("upload of {} to {}", remote_path, self.target.name);
        let content = content.as_slice();
        let result = retry(&self.policies.transfer, &what, |_| async move {
            let session = match self.connect().await {
                Ok(session) => session,
                Err(e) => return Ok(Err(e)),
            };
            let result = session.write_file(remote_path, content).await;
            session.close().await;
            result.map(Ok).map_err(|e| e.to_string())
        })
        .await;
        self.transfer_outcome(remote_path, result)
    }

    /// A download counts as successful once the local file exists.
    async fn download(
        &self,
        remote_path: &Utf8Path,
        local_path: &Utf8Path,
    ) -> Result<(), ChannelError> {
        let what = format!("download of {} from {}", remote_path, self.target.name);
        let result = retry(&self.policies.transfer, &what, |_| async move {
            let session = match self.connect().await {
                Ok(session) => session,
                Err(e) => return Ok(Err(e)),
            };
            let result = session.read_file(remote_path).await;
            session.close().await;
            let content = result.map_err(|e| e.to_string())?;
            if let Some(parent) = local_path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| e.to_string())?;
            }
            tokio::fs::write(local_path, content)
                .await
                .map_err(|e| e.to_string())?;
            match tokio::fs::try_exists(local_path).await {
                Ok(true) => Ok(Ok(())),
                _ => Err(format!("{} was not written", local_path)),
            }
        })
        .await;
        self.transfer_outcome(remote_path, result)
    }

    async fn read_remote_file(&self, path: &Utf8Path) -> Result<Vec<String>, ChannelError> {
        let session = self.connect().await?;
        let result = session.read_file(path).await;
        session.close().await;
        let bytes = result.map_err(|e| self.transfer_failed(path, 1, e.to_string()))?;
        Ok(content_lines(&String::from_utf8_lossy(&bytes)))
    }

    async fn last_modified(&self, path: &Utf8Path) -> Result<Option<DateTime<Utc>>, ChannelError> {
        let session = self.connect().await?;
        let mtime = session.modified_time(path).await;
        session.close().await;
        self.modification_time(path, mtime)
    }
}

fn default_key_path() -> Utf8PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
    Utf8PathBuf::from(home).join(".ssh").join("id_rsa")
}
