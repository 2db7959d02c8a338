//! Cluster scheduler integration for remedy.
//!
//! Command sets, queue-listing parsing and canonical status translation
//! for the supported schedulers (OGE and Slurm).

pub mod commands;
pub mod oge;
pub mod slurm;
pub mod translate;
pub mod types;

pub use commands::{CommandSet, Scheduler};
pub use translate::{parse_queue, parse_submission, translate_status};
pub use types::{CanonicalStatus, NamingConvention, QueueEntry, SchedulerError};
