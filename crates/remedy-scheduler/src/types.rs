//! Scheduler-facing types.

use miette::Diagnostic;
use once_cell::sync::Lazy;
use regex::Regex;
use remedy_core::JobStatus;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum SchedulerError {
    #[error("Submission was not acknowledged: stdout={stdout:?}, stderr={stderr:?}")]
    #[diagnostic(
        code(remedy::scheduler::submission_failed),
        help("check the submit command and the submit script on the target")
    )]
    SubmissionFailed { stdout: Vec<String>, stderr: Vec<String> },

    #[error("Failed to parse scheduler output: {0}")]
    ParseError(String),
}

/// Normalized job state derived from a queue listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalStatus {
    Running,
    Done,
    Errored,
    /// Errored on the node with this suffix
    ErroredOnNode(String),
}

impl From<CanonicalStatus> for JobStatus {
    fn from(status: CanonicalStatus) -> Self {
        match status {
            CanonicalStatus::Running => JobStatus::Running,
            CanonicalStatus::Done => JobStatus::Done,
            CanonicalStatus::Errored => JobStatus::Errored,
            CanonicalStatus::ErroredOnNode(node) => JobStatus::ErroredOnNode(node),
        }
    }
}

/// One job line from a queue listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Scheduler job ID
    pub job_id: String,
    /// Job name as submitted
    pub name: String,
    /// Owning user
    pub user: String,
    /// Raw state code (e.g. "r", "qw", "PD")
    pub state: String,
}

static DEFAULT_JOB_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^a\d+$").expect("valid job name regex"));

/// Job names the engine gives its own jobs, used to recognise orphans.
#[derive(Debug, Clone)]
pub struct NamingConvention {
    pattern: Regex,
}

impl NamingConvention {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

impl Default for NamingConvention {
    /// Names made of the letter `a` followed by digits.
    fn default() -> Self {
        Self {
            pattern: DEFAULT_JOB_NAME.clone(),
        }
    }
}
