//! Scripted channel for tests.

use camino::{Utf8Path, Utf8PathBuf};
use remedy_channel::{ChannelError, CommandOutput, ExecutionChannel, UploadSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Handler = dyn Fn(usize, &str) -> Result<CommandOutput, ChannelError> + Send + Sync;

struct Inner {
    handler: Box<Handler>,
    calls: AtomicUsize,
    commands: Mutex<Vec<String>>,
    uploads: Mutex<Vec<Utf8PathBuf>>,
    files: Mutex<HashMap<Utf8PathBuf, String>>,
}

/// Answers commands through a closure and keeps remote files in memory.
#[derive(Clone)]
pub(crate) struct FakeChannel {
    inner: Arc<Inner>,
}

impl FakeChannel {
    pub fn new(
        handler: impl Fn(&str) -> Result<CommandOutput, ChannelError> + Send + Sync + 'static,
    ) -> Self {
        Self::counting(move |_, command| handler(command))
    }

    /// Handler also receives the 0-based index of the call.
    pub fn counting(
        handler: impl Fn(usize, &str) -> Result<CommandOutput, ChannelError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                handler: Box::new(handler),
                calls: AtomicUsize::new(0),
                commands: Mutex::new(Vec::new()),
                uploads: Mutex::new(Vec::new()),
                files: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn put_file(&self, path: impl Into<Utf8PathBuf>, content: &str) {
        self.inner
            .files
            .lock()
            .unwrap()
            .insert(path.into(), content.to_string());
    }

    pub fn commands(&self) -> Vec<String> {
        self.inner.commands.lock().unwrap().clone()
    }

    pub fn uploaded_paths(&self) -> Vec<Utf8PathBuf> {
        self.inner.uploads.lock().unwrap().clone()
    }

    fn file(&self, path: &Utf8Path) -> Option<String> {
        self.inner.files.lock().unwrap().get(path).cloned()
    }
}

impl ExecutionChannel for FakeChannel {
    async fn execute(
        &self,
        command: &str,
        _working_dir: Option<&Utf8Path>,
    ) -> Result<CommandOutput, ChannelError> {
        self.inner.commands.lock().unwrap().push(command.to_string());
        let call = self.inner.calls.fetch_add(1, Ordering::SeqCst);
        (self.inner.handler)(call, command)
    }

    async fn upload(
        &self,
        remote_path: &Utf8Path,
        source: UploadSource<'_>,
    ) -> Result<(), ChannelError> {
        let content = match source {
            UploadSource::Content(text) => text.to_string(),
            UploadSource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| ChannelError::Io {
                    path: path.to_owned(),
                    source,
                })?
            }
        };
        self.inner.uploads.lock().unwrap().push(remote_path.to_owned());
        self.put_file(remote_path, &content);
        Ok(())
    }

    async fn download(
        &self,
        remote_path: &Utf8Path,
        local_path: &Utf8Path,
    ) -> Result<(), ChannelError> {
        let content = self
            .file(remote_path)
            .ok_or_else(|| ChannelError::TransferFailed {
                target: "fake".to_string(),
                path: remote_path.to_owned(),
                attempts: 1,
                last_error: "no such file".to_string(),
            })?;
        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ChannelError::Io {
                path: parent.to_owned(),
                source,
            })?;
        }
        std::fs::write(local_path, content).map_err(|source| ChannelError::Io {
            path: local_path.to_owned(),
            source,
        })
    }

    async fn read_remote_file(&self, path: &Utf8Path) -> Result<Vec<String>, ChannelError> {
        Ok(self
            .file(path)
            .map(|c| c.lines().map(str::to_string).collect())
            .unwrap_or_default())
    }

    async fn last_modified(
        &self,
        path: &Utf8Path,
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>, ChannelError> {
        Ok(self.file(path).map(|_| chrono::Utc::now()))
    }
}

/// Successful command output with the given stdout lines.
pub(crate) fn stdout(lines: &[&str]) -> CommandOutput {
    CommandOutput {
        stdout: lines.iter().map(|l| l.to_string()).collect(),
        stderr: Vec::new(),
    }
}
