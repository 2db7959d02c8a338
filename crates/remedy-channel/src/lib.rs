//! Remote execution channel for remedy.
//!
//! Runs shell commands and moves files on a target, either over SSH or
//! directly on the local machine, with bounded retries on every step.

pub mod error;
pub mod local;
pub mod retry;
pub mod ssh;

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use remedy_core::Target;
use std::future::Future;
use std::sync::Arc;

pub use error::ChannelError;
pub use local::LocalChannel;
pub use remedy_parsers::CommandOutput;
pub use retry::{Backoff, ChannelPolicies, RetryExhausted, RetryPolicy, retry};
pub use ssh::SshChannel;

/// What to upload: an existing local file or in-memory content.
#[derive(Debug, Clone, Copy)]
pub enum UploadSource<'a> {
    File(&'a Utf8Path),
    Content(&'a str),
}

/// Operations every target supports.
///
/// Each call opens its own connection and closes it before returning.
/// Implementations retry internally and only surface exhausted errors.
pub trait ExecutionChannel: Send + Sync {
    /// Run a shell command, optionally from `working_dir`.
    fn execute(
        &self,
        command: &str,
        working_dir: Option<&Utf8Path>,
    ) -> impl Future<Output = Result<CommandOutput, ChannelError>> + Send;

    fn upload(
        &self,
        remote_path: &Utf8Path,
        source: UploadSource<'_>,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;

    fn download(
        &self,
        remote_path: &Utf8Path,
        local_path: &Utf8Path,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;

    fn read_remote_file(
        &self,
        path: &Utf8Path,
    ) -> impl Future<Output = Result<Vec<String>, ChannelError>> + Send;

    /// Modification time of a file on the target; `None` if it does not exist.
    fn last_modified(
        &self,
        path: &Utf8Path,
    ) -> impl Future<Output = Result<Option<DateTime<Utc>>, ChannelError>> + Send;
}

/// Channel resolved once from a target's configuration.
pub enum Channel {
    Local(LocalChannel),
    Ssh(SshChannel),
}

impl Channel {
    pub fn for_target(target: Arc<Target>, policies: ChannelPolicies) -> Self {
        if target.is_local() {
            Self::Local(LocalChannel::new(policies))
        } else {
            Self::Ssh(SshChannel::new(target, policies))
        }
    }
}

impl ExecutionChannel for Channel {
    async fn execute(
        &self,
        command: &str,
        working_dir: Option<&Utf8Path>,
    ) -> Result<CommandOutput, ChannelError> {
        match self {
            Self::Local(c) => c.execute(command, working_dir).await,
            Self::Ssh(c) => c.execute(command, working_dir).await,
        }
    }

    async fn upload(
        &self,
        remote_path: &Utf8Path,
        source: UploadSource<'_>,
    ) -> Result<(), ChannelError> {
        match self {
            Self::Local(c) => c.upload(remote_path, source).await,
            Self::Ssh(c) => c.upload(remote_path, source).await,
        }
    }

    async fn download(
        &self,
        remote_path: &Utf8Path,
        local_path: &Utf8Path,
    ) -> Result<(), ChannelError> {
        match self {
            Self::Local(c) => c.download(remote_path, local_path).await,
            Self::Ssh(c) => c.download(remote_path, local_path).await,
        }
    }

    async fn read_remote_file(&self, path: &Utf8Path) -> Result<Vec<String>, ChannelError> {
        match self {
            Self::Local(c) => c.read_remote_file(path).await,
            Self::Ssh(c) => c.read_remote_file(path).await,
        }
    }

    async fn last_modified(&self, path: &Utf8Path) -> Result<Option<DateTime<Utc>>, ChannelError> {
        match self {
            Self::Local(c) => c.last_modified(path).await,
            Self::Ssh(c) => c.last_modified(path).await,
        }
    }
}

/// Split file content into lines, as read from a remote file.
pub(crate) fn content_lines(content: &str) -> Vec<String> {
    content.lines().map(str::to_string).collect()
}
