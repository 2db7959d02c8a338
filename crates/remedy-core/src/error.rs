//! Configuration errors.

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Unsupported scheduler '{0}'")]
    #[diagnostic(
        code(remedy::config::unsupported_scheduler),
        help("supported schedulers are OGE and Slurm")
    )]
    UnsupportedScheduler(String),

    #[error("Unknown target '{name}'")]
    #[diagnostic(
        code(remedy::config::unknown_target),
        help("defined targets are: {known}")
    )]
    UnknownTarget { name: String, known: String },

    #[error("Target '{name}' is invalid: {reason}")]
    #[diagnostic(code(remedy::config::invalid_target))]
    InvalidTarget { name: String, reason: String },

    #[error("Failed to read registry file {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse registry: {0}")]
    Json(#[from] serde_json::Error),
}
