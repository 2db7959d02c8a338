//! Job lifecycle for remedy: submission, polling, troubleshooting and
//! resubmission, one tokio task per job.

pub mod collab;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod runner;

#[cfg(test)]
mod fake;

pub use collab::{InputRenderer, LogClassifier, RenderRequest, RenderedJob};
pub use error::RunError;
pub use orchestrator::{
    FailureReason, JobHandle, JobOutcome, Orchestrator, OrchestratorConfig, Outcome,
};
pub use output::output_file_name;
pub use runner::JobRunner;
