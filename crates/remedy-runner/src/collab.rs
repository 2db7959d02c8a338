//! Traits for the program-specific pieces the engine does not own.

use remedy_core::{Job, JobKind, Target};
use remedy_trsh::Classification;

/// Everything a renderer needs to produce a job's input and submit script.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub job: &'a Job,
    pub target: &'a Target,
    /// Wall-clock limit already formatted for the target's scheduler
    pub walltime: &'a str,
    /// File name the submit command expects
    pub submit_filename: &'a str,
}

/// Rendered files, uploaded to the job's remote directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedJob {
    /// File name of the program input (e.g. `input.gjf`)
    pub input_filename: String,
    pub input: String,
    pub submit_script: String,
}

/// Produces program input and the scheduler submit script for a job.
pub trait InputRenderer: Send + Sync {
    fn render(&self, request: &RenderRequest<'_>) -> Result<RenderedJob, String>;
}

/// Reads a program's output and reports whether it terminated normally.
pub trait LogClassifier: Send + Sync {
    fn classify(&self, output: &[String], kind: JobKind, software: &str) -> Classification;
}
