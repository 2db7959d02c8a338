//! Channel errors. Every variant here is final: retries already happened.

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ChannelError {
    #[error("Could not connect to {target} after {attempts} trials: {last_error}")]
    #[diagnostic(
        code(remedy::channel::connection_exhausted),
        help("check connectivity and credentials for this target")
    )]
    ConnectionExhausted {
        target: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Command '{command}' on {target} failed twice at the transport level: {error}")]
    #[diagnostic(code(remedy::channel::command_transport))]
    CommandTransport {
        target: String,
        command: String,
        error: String,
    },

    #[error("Could not transfer {path} on {target} after {attempts} attempts: {last_error}")]
    #[diagnostic(
        code(remedy::channel::transfer_failed),
        help("check connectivity and free disk space on both ends")
    )]
    TransferFailed {
        target: String,
        path: Utf8PathBuf,
        attempts: u32,
        last_error: String,
    },

    #[error("Command '{command}' is erroneous, failed {attempts} times: {last_error}")]
    #[diagnostic(
        code(remedy::channel::command_exhausted),
        help("run the command manually on the target; use `which` to locate scheduler binaries")
    )]
    CommandExhausted {
        command: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Cannot upload a non-existing file {0}")]
    MissingLocalFile(Utf8PathBuf),

    #[error("IO error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ChannelError {
    /// Whether the failure is about reaching the target rather than the command itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ConnectionExhausted { .. }
                | Self::CommandTransport { .. }
                | Self::TransferFailed { .. }
        )
    }
}
