//! Scheduler command sets and the per-scheduler capability interface.

use crate::{oge, slurm};
use remedy_core::{SchedulerKind, Target};
use std::time::Duration;

/// State codes meaning "running" for every scheduler: running, queued-waiting, transferring.
const ACTIVE_STATES: [&str; 3] = ["r", "qw", "t"];

/// Shell commands used to drive a scheduler on one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSet {
    pub submit: String,
    pub status: String,
    pub delete: String,
    pub submit_filename: String,
}

impl CommandSet {
    /// Resolve the command set for a target: scheduler defaults plus overrides.
    pub fn for_target(target: &Target) -> Self {
        let defaults = target.scheduler.default_commands();
        let overrides = &target.commands;
        Self {
            submit: overrides.submit.clone().unwrap_or(defaults.submit),
            status: overrides.status.clone().unwrap_or(defaults.status),
            delete: overrides.delete.clone().unwrap_or(defaults.delete),
            submit_filename: overrides
                .submit_filename
                .clone()
                .unwrap_or(defaults.submit_filename),
        }
    }

    /// Command listing all jobs of `username`.
    pub fn status_query(&self, username: &str) -> String {
        format!("{} -u {}", self.status, username)
    }

    /// Command submitting the submit script from the job's directory.
    pub fn submit_job(&self) -> String {
        format!("{} {}", self.submit, self.submit_filename)
    }

    /// Command deleting one job.
    pub fn delete_job(&self, job_id: &str) -> String {
        format!("{} {}", self.delete, job_id)
    }
}

/// Behaviour that differs between scheduler kinds.
pub trait Scheduler {
    /// Default commands for this scheduler.
    fn default_commands(&self) -> CommandSet;

    /// Number of header lines preceding job lines in a queue listing.
    fn header_lines(&self) -> usize;

    /// Whitespace field holding the job ID in the submission acknowledgement.
    fn ack_id_index(&self) -> usize;

    /// Whether a queue state code means the job is still alive.
    fn is_active_state(&self, code: &str) -> bool;

    /// Recover the failing node's suffix from a queue line.
    fn node_suffix(&self, status_line: &str) -> Option<String>;

    /// Format a wall-clock limit the way submit scripts expect it.
    fn format_walltime(&self, limit: Duration) -> String;
}

impl Scheduler for SchedulerKind {
    fn default_commands(&self) -> CommandSet {
        match self {
            Self::Oge => oge::default_commands(),
            Self::Slurm => slurm::default_commands(),
        }
    }

    fn header_lines(&self) -> usize {
        match self {
            Self::Oge => oge::HEADER_LINES,
            Self::Slurm => slurm::HEADER_LINES,
        }
    }

    fn ack_id_index(&self) -> usize {
        match self {
            Self::Oge => oge::ACK_ID_INDEX,
            Self::Slurm => slurm::ACK_ID_INDEX,
        }
    }

    fn is_active_state(&self, code: &str) -> bool {
        let code = code.to_lowercase();
        if ACTIVE_STATES.contains(&code.as_str()) {
            return true;
        }
        match self {
            Self::Oge => false,
            Self::Slurm => slurm::EXTRA_ACTIVE_STATES.contains(&code.as_str()),
        }
    }

    fn node_suffix(&self, status_line: &str) -> Option<String> {
        match self {
            Self::Oge => oge::node_suffix(status_line),
            Self::Slurm => slurm::node_suffix(status_line),
        }
    }

    fn format_walltime(&self, limit: Duration) -> String {
        match self {
            Self::Oge => remedy_parsers::format_duration_hours(limit),
            Self::Slurm => remedy_parsers::format_duration_slurm(limit),
        }
    }
}
