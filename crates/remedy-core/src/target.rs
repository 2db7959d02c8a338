//! Execution targets: a local machine or a remote cluster head node.

use crate::error::ConfigError;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name reserved for the machine remedy itself runs on.
pub const LOCAL_TARGET: &str = "local";

/// Cluster scheduler software running on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedulerKind {
    /// Oracle (Sun) Grid Engine
    Oge,
    /// Simple Linux Utility for Resource Management
    Slurm,
}

impl FromStr for SchedulerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "oge" | "sge" => Ok(Self::Oge),
            "slurm" => Ok(Self::Slurm),
            other => Err(ConfigError::UnsupportedScheduler(other.to_string())),
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oge => write!(f, "OGE"),
            Self::Slurm => write!(f, "Slurm"),
        }
    }
}

/// Optional per-target replacements for the scheduler's default command set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOverrides {
    #[serde(default)]
    pub submit: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub delete: Option<String>,
    #[serde(default)]
    pub submit_filename: Option<String>,
}

/// Raw target entry as found in the registry file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Scheduler name ("OGE" or "Slurm")
    pub scheduler: String,

    /// Host address; absent for the local target
    #[serde(default)]
    pub address: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Username on the target
    #[serde(alias = "un")]
    pub username: String,

    /// Path to the private key used to authenticate
    #[serde(default)]
    pub key: Option<Utf8PathBuf>,

    #[serde(default)]
    pub max_cpus: Option<u32>,

    /// Maximum memory a single job may request, in MB
    #[serde(default)]
    pub max_job_memory_mb: Option<u64>,

    #[serde(default)]
    pub commands: CommandOverrides,
}

fn default_port() -> u16 {
    22
}

/// A named execution endpoint. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub scheduler: SchedulerKind,
    pub address: Option<String>,
    pub port: u16,
    pub username: String,
    pub key: Option<Utf8PathBuf>,
    pub max_cpus: Option<u32>,
    pub max_job_memory_mb: Option<u64>,
    pub commands: CommandOverrides,
}

impl Target {
    /// Validate a raw registry entry.
    pub fn from_config(name: &str, config: TargetConfig) -> Result<Self, ConfigError> {
        let scheduler: SchedulerKind = config.scheduler.parse()?;

        if config.username.trim().is_empty() {
            return Err(ConfigError::InvalidTarget {
                name: name.to_string(),
                reason: "username must not be empty".to_string(),
            });
        }
        if name != LOCAL_TARGET && config.address.is_none() {
            return Err(ConfigError::InvalidTarget {
                name: name.to_string(),
                reason: "remote targets need an address".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            scheduler,
            address: config.address,
            port: config.port,
            username: config.username,
            key: config.key,
            max_cpus: config.max_cpus,
            max_job_memory_mb: config.max_job_memory_mb,
            commands: config.commands,
        })
    }

    /// Build the local target (no network hop).
    pub fn local(scheduler: SchedulerKind, username: impl Into<String>) -> Self {
        Self {
            name: LOCAL_TARGET.to_string(),
            scheduler,
            address: None,
            port: default_port(),
            username: username.into(),
            key: None,
            max_cpus: None,
            max_job_memory_mb: None,
            commands: CommandOverrides::default(),
        }
    }

    /// Build a remote target reached over SSH.
    pub fn remote(
        name: impl Into<String>,
        scheduler: SchedulerKind,
        address: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            scheduler,
            address: Some(address.into()),
            port: default_port(),
            username: username.into(),
            key: None,
            max_cpus: None,
            max_job_memory_mb: None,
            commands: CommandOverrides::default(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.address.is_none()
    }
}
