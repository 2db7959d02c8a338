//! Core data model for remedy.
//!
//! Targets and their registry, jobs with their resource requests and
//! troubleshooting history, and configuration errors.

pub mod error;
pub mod job;
pub mod registry;
pub mod target;

pub use error::ConfigError;
pub use job::{
    Job, JobKind, JobStatus, RemedyCategory, ResourceRequest, ScfStrategy, TroubleshootingHistory,
};
pub use registry::TargetRegistry;
pub use target::{CommandOverrides, SchedulerKind, Target, TargetConfig};
