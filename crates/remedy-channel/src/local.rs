//! Local execution: commands through `sh -c`, files through the filesystem.

use crate::error::ChannelError;
use crate::retry::{ChannelPolicies, retry};
use crate::{CommandOutput, ExecutionChannel, UploadSource, content_lines};
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use remedy_parsers::run_shell;

/// Channel for a target whose scheduler runs on this machine.
pub struct LocalChannel {
    policies: ChannelPolicies,
}

impl LocalChannel {
    pub fn new(policies: ChannelPolicies) -> Self {
        Self { policies }
    }
}

impl ExecutionChannel for LocalChannel {
    /// Non-zero exits are retried; exhaustion means the command itself is broken.
    async fn execute(
        &self,
        command: &str,
        working_dir: Option<&Utf8Path>,
    ) -> Result<CommandOutput, ChannelError> {
        let what = format!("local command '{}'", command);
        retry(&self.policies.local_command, &what, |_| {
            run_shell(command, working_dir.map(Utf8Path::as_std_path))
        })
        .await
        .map_err(|e| ChannelError::CommandExhausted {
            command: command.to_string(),
            attempts: e.attempts,
            last_error: e.last_error.to_string(),
        })
    }

    async fn upload(
        &self,
        remote_path: &Utf8Path,
        source: UploadSource<'_>,
    ) -> Result<(), ChannelError> {
        if let UploadSource::File(local) = source
            && !tokio::fs::try_exists(local).await.unwrap_or(false)
        {
            return Err(ChannelError::MissingLocalFile(local.to_owned()));
        }
        let what = format!("copy to {}", remote_path);
        retry(&self.policies.transfer, &what, |_| async move {
            if let Some(parent) = remote_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            match source {
                UploadSource::File(local) => tokio::fs::copy(local, remote_path).await.map(|_| ()),
                UploadSource::Content(text) => tokio::fs::write(remote_path, text).await,
            }
        })
        .await
        .map_err(|e| ChannelError::TransferFailed {
            target: remedy_core::target::LOCAL_TARGET.to_string(),
            path: remote_path.to_owned(),
            attempts: e.attempts,
            last_error: e.last_error.to_string(),
        })
    }

    async fn download(
        &self,
        remote_path: &Utf8Path,
        local_path: &Utf8Path,
    ) -> Result<(), ChannelError> {
        if remote_path == local_path {
            return match tokio::fs::try_exists(local_path).await {
                Ok(true) => Ok(()),
                _ => Err(ChannelError::TransferFailed {
                    target: remedy_core::target::LOCAL_TARGET.to_string(),
                    path: remote_path.to_owned(),
                    attempts: 1,
                    last_error: "file does not exist".to_string(),
                }),
            };
        }
        let what = format!("copy of {}", remote_path);
        retry(&self.policies.transfer, &what, |_| async move {
            if let Some(parent) = local_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(remote_path, local_path).await.map(|_| ())
        })
        .await
        .map_err(|e| ChannelError::TransferFailed {
            target: remedy_core::target::LOCAL_TARGET.to_string(),
            path: remote_path.to_owned(),
            attempts: e.attempts,
            last_error: e.last_error.to_string(),
        })
    }

    async fn read_remote_file(&self, path: &Utf8Path) -> Result<Vec<String>, ChannelError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ChannelError::Io {
                path: path.to_owned(),
                source,
            })?;
        Ok(content_lines(&content))
    }

    async fn last_modified(&self, path: &Utf8Path) -> Result<Option<DateTime<Utc>>, ChannelError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(meta.modified().ok().map(DateTime::<Utc>::from)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ChannelError::Io {
                path: path.to_owned(),
                source,
            }),
        }
    }
}
