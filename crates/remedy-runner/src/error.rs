use camino::Utf8PathBuf;
use remedy_channel::ChannelError;
use remedy_core::ConfigError;
use remedy_scheduler::SchedulerError;
use remedy_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to persist troubleshooting history: {0}")]
    Store(#[from] StoreError),

    #[error("Job {0} was never submitted")]
    NotSubmitted(String),

    #[error("Status query on {target} kept failing after {attempts} attempts: {stderr}")]
    StatusQueryExhausted {
        target: String,
        attempts: u32,
        stderr: String,
    },

    #[error("No known output file for software {0}")]
    UnknownSoftware(String),

    #[error("Could not render input for job {job}: {reason}")]
    Render { job: String, reason: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    /// Whether the error means the target could not be reached.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Channel(e) => e.is_transport(),
            Self::StatusQueryExhausted { .. } => true,
            _ => false,
        }
    }
}
