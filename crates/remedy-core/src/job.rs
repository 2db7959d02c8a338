//! Jobs, their resource requests and troubleshooting history.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Job status as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Not yet handed to the scheduler
    BeforeSubmission,
    /// Queued or executing
    Running,
    /// No longer tracked by the scheduler
    Done,
    /// Failed at the scheduler level
    Errored,
    /// Failed at the scheduler level on a known node (node suffix)
    ErroredOnNode(String),
}

impl JobStatus {
    /// Terminal from the scheduler's perspective.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Errored | Self::ErroredOnNode(_))
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::BeforeSubmission => "○",
            Self::Running => "●",
            Self::Done => "✓",
            Self::Errored | Self::ErroredOnNode(_) => "✗",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeSubmission => write!(f, "before_submission"),
            Self::Running => write!(f, "running"),
            Self::Done => write!(f, "done"),
            Self::Errored => write!(f, "errored"),
            Self::ErroredOnNode(node) => write!(f, "errored on node {}", node),
        }
    }
}

/// Kind of computation a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    Conformer,
    Opt,
    Freq,
    Sp,
    Composite,
    Scan,
    Irc,
    Orbitals,
}

/// Resources requested from the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub cpus: u32,
    /// Total job memory in MB
    pub memory_mb: u64,
    pub wall_time: Duration,
}

impl Default for ResourceRequest {
    fn default() -> Self {
        Self {
            cpus: 8,
            memory_mb: 14 * 1024,
            wall_time: Duration::from_secs(120 * 3600),
        }
    }
}

/// SCF convergence strategies, tried in order for a given software.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScfStrategy {
    QuadraticConvergence,
    Damping,
    NoDiis,
    DiisGdm,
}

/// A class of corrective action. Each class is applied at most once per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RemedyCategory {
    ChangeNode,
    RemoveCheckpoint,
    OutputMissing,
    CartesianCoordinates,
    IntegralAccuracy,
    MaxCycles,
    Scf(ScfStrategy),
    Memory,
    CpuRebalance,
    CpuLimit,
    CompositeFallback,
    BasisSet,
}

impl fmt::Display for RemedyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeNode => write!(f, "change_node"),
            Self::RemoveCheckpoint => write!(f, "remove_checkpoint"),
            Self::OutputMissing => write!(f, "restart_due_to_file_not_found"),
            Self::CartesianCoordinates => write!(f, "cartesian"),
            Self::IntegralAccuracy => write!(f, "integral_accuracy"),
            Self::MaxCycles => write!(f, "max_cycles"),
            Self::Scf(strategy) => write!(f, "scf:{:?}", strategy),
            Self::Memory => write!(f, "memory"),
            Self::CpuRebalance => write!(f, "cpu_rebalance"),
            Self::CpuLimit => write!(f, "cpu"),
            Self::CompositeFallback => write!(f, "composite_fallback"),
            Self::BasisSet => write!(f, "basis_set"),
        }
    }
}

/// Remedy categories already attempted, in the order they were applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TroubleshootingHistory(Vec<RemedyCategory>);

impl TroubleshootingHistory {
    pub fn contains(&self, category: RemedyCategory) -> bool {
        self.0.contains(&category)
    }

    /// Record a category. Returns false if it was already present.
    pub fn insert(&mut self, category: RemedyCategory) -> bool {
        if self.contains(category) {
            return false;
        }
        self.0.push(category);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemedyCategory> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<RemedyCategory> {
        self.0.clone()
    }
}

impl FromIterator<RemedyCategory> for TroubleshootingHistory {
    fn from_iter<I: IntoIterator<Item = RemedyCategory>>(iter: I) -> Self {
        let mut history = Self::default();
        for category in iter {
            history.insert(category);
        }
        history
    }
}

/// The mutable unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Name shown in the scheduler queue (engine convention: `a<digits>`)
    pub name: String,

    /// Species/task label owning the job
    pub label: String,

    /// Target name in the registry
    pub target: String,

    /// Scheduler-assigned identifier, set on submission
    pub scheduler_id: Option<String>,

    pub resources: ResourceRequest,

    /// Electronic structure software, lowercase (e.g. "gaussian")
    pub software: String,

    pub kind: JobKind,

    /// Opaque level-of-theory descriptor consumed by the template renderer
    pub level_of_theory: String,

    /// Extra input directives added by troubleshooting
    pub directives: Vec<String>,

    pub status: JobStatus,

    pub history: TroubleshootingHistory,

    /// Node suffixes the job must avoid
    pub excluded_nodes: Vec<String>,

    /// Checkpoint artifact to restart from, if any
    pub checkpoint: Option<Utf8PathBuf>,

    /// Working directory on the target
    pub remote_dir: Utf8PathBuf,

    /// Local directory receiving downloaded output
    pub local_dir: Utf8PathBuf,
}

impl Job {
    pub fn new(
        label: impl Into<String>,
        number: u32,
        target: impl Into<String>,
        software: impl Into<String>,
        kind: JobKind,
        level_of_theory: impl Into<String>,
        resources: ResourceRequest,
    ) -> Self {
        let label = label.into();
        let name = format!("a{}", number);
        let dir = Utf8PathBuf::from("runs").join(&label).join(&name);
        Self {
            name,
            label,
            target: target.into(),
            scheduler_id: None,
            resources,
            software: software.into().to_lowercase(),
            kind,
            level_of_theory: level_of_theory.into(),
            directives: Vec::new(),
            status: JobStatus::BeforeSubmission,
            history: TroubleshootingHistory::default(),
            excluded_nodes: Vec::new(),
            checkpoint: None,
            remote_dir: dir.clone(),
            local_dir: dir,
        }
    }

    /// Set the remote and local working directories.
    pub fn with_dirs(mut self, remote_dir: Utf8PathBuf, local_dir: Utf8PathBuf) -> Self {
        self.remote_dir = remote_dir;
        self.local_dir = local_dir;
        self
    }

    /// Forget scheduler state before a resubmission.
    pub fn reset_for_resubmission(&mut self) {
        self.scheduler_id = None;
        self.status = JobStatus::BeforeSubmission;
    }
}
