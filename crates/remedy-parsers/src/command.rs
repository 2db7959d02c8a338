//! Command execution utilities for scheduler and shell invocations.

use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

/// Error type for command execution.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to execute {command}: {error}")]
    Execution { command: String, error: String },
    #[error("Command {command} failed with status {status:?}: {stderr}")]
    Failed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
}

/// Captured output of a finished command, split into lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CommandOutput {
    pub fn from_bytes(stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            stdout: split_lines(stdout),
            stderr: split_lines(stderr),
        }
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Run a shell command line through `sh -c`, optionally inside `working_dir`.
///
/// Scheduler commands are configured as shell snippets (e.g. with an
/// `export SGE_ROOT=...;` prefix), so they are never split into argv here.
pub async fn run_shell(
    command: &str,
    working_dir: Option<&Path>,
) -> Result<CommandOutput, CommandError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }
    tracing::debug!("running local command: {}", command);

    let output = cmd.output().await.map_err(|e| CommandError::Execution {
        command: command.to_string(),
        error: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(CommandError::Failed {
            command: command.to_string(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(CommandOutput::from_bytes(&output.stdout, &output.stderr))
}
