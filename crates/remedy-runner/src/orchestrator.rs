//! Per-job monitoring tasks.
//!
//! Every job runs in its own tokio task: submit, poll until the scheduler
//! lets go of it, inspect the output, and resubmit with a remedy until the
//! job succeeds or troubleshooting runs out of options.

use crate::collab::{InputRenderer, LogClassifier, RenderRequest};
use crate::error::RunError;
use crate::runner::{JobRunner, STATUS_RETRY};
use camino::Utf8PathBuf;
use remedy_channel::{Channel, ChannelPolicies, ExecutionChannel, RetryPolicy};
use remedy_core::{Job, JobStatus, Target, TargetRegistry, TroubleshootingHistory};
use remedy_parsers::format_duration;
use remedy_scheduler::{NamingConvention, SchedulerError};
use remedy_store::{HistoryStore, RecordStatus};
use remedy_trsh::{
    Classification, Decision, ErrorEvidence, Remedy, TrshError, TrshLimits, apply, decide,
    troubleshoot_missing_output, troubleshoot_server,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pause between status polls of a running job.
    pub poll_interval: Duration,
    /// Multiplier applied to memory estimates printed by programs.
    pub memory_margin: f64,
    /// Directory holding `.remedy/history`.
    pub project_dir: Utf8PathBuf,
    /// Budget for status queries answering on stderr.
    pub status_retry: RetryPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            memory_margin: TrshLimits::default().memory_margin,
            project_dir: Utf8PathBuf::from("."),
            status_retry: STATUS_RETRY,
        }
    }
}

/// Why a job stopped without succeeding or exhausting its remedies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Cancelled,
    /// The target could not be reached
    Transport(String),
    SubmissionFailed(String),
    SpeciesError(String),
    UserActionRequired(String),
    Render(String),
    /// History could not be saved before a resubmission
    Persistence(String),
    /// Unexpected error, e.g. unknown software or a panicked task
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(FailureReason),
    /// Troubleshooting has no untried remedy left
    Exhausted,
}

impl Outcome {
    fn record_status(&self) -> RecordStatus {
        match self {
            Self::Succeeded => RecordStatus::Succeeded,
            Self::Failed(_) => RecordStatus::Failed,
            Self::Exhausted => RecordStatus::Exhausted,
        }
    }
}

/// Final report of one job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub label: String,
    pub job_name: String,
    pub outcome: Outcome,
    /// Evidence from the last failed run, if any
    pub last_evidence: Option<ErrorEvidence>,
    pub history: TroubleshootingHistory,
}

/// Handle to a spawned job task.
pub struct JobHandle {
    label: String,
    job_name: String,
    cancel: watch::Sender<bool>,
    task: JoinHandle<JobOutcome>,
}

impl JobHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Request cancellation. The task deletes the remote job and stops.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the job's outcome.
    pub async fn join(self) -> JobOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => JobOutcome {
                label: self.label,
                job_name: self.job_name,
                outcome: Outcome::Failed(FailureReason::Internal(e.to_string())),
                last_evidence: None,
                history: TroubleshootingHistory::default(),
            },
        }
    }
}

/// Spawns and tracks job tasks across the targets of a registry.
pub struct Orchestrator<C> {
    runners: BTreeMap<String, Arc<JobRunner<C>>>,
    renderer: Arc<dyn InputRenderer>,
    classifier: Arc<dyn LogClassifier>,
    store: Arc<Mutex<HistoryStore>>,
    config: OrchestratorConfig,
}

impl Orchestrator<Channel> {
    /// Orchestrator using SSH or local channels as each target requires.
    pub fn with_channels(
        registry: &TargetRegistry,
        renderer: Arc<dyn InputRenderer>,
        classifier: Arc<dyn LogClassifier>,
        config: OrchestratorConfig,
        policies: ChannelPolicies,
    ) -> Self {
        Self::new(registry, renderer, classifier, config, |target| {
            Channel::for_target(target, policies)
        })
    }
}

impl<C: ExecutionChannel + 'static> Orchestrator<C> {
    pub fn new(
        registry: &TargetRegistry,
        renderer: Arc<dyn InputRenderer>,
        classifier: Arc<dyn LogClassifier>,
        config: OrchestratorConfig,
        make_channel: impl Fn(Arc<Target>) -> C,
    ) -> Self {
        let runners = registry
            .iter()
            .map(|target| {
                let runner = JobRunner::new(Arc::clone(target), make_channel(Arc::clone(target)))
                    .with_status_retry(config.status_retry);
                (target.name.clone(), Arc::new(runner))
            })
            .collect();
        let store = HistoryStore::new(&config.project_dir);
        Self {
            runners,
            renderer,
            classifier,
            store: Arc::new(Mutex::new(store)),
            config,
        }
    }

    /// Runner for a target by name.
    pub fn runner(&self, target: &str) -> Result<Arc<JobRunner<C>>, RunError> {
        self.runners.get(target).cloned().ok_or_else(|| {
            RunError::Config(remedy_core::ConfigError::UnknownTarget {
                name: target.to_string(),
                known: self
                    .runners
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        })
    }

    /// Start monitoring a job in its own task.
    pub fn spawn(&self, job: Job) -> Result<JobHandle, RunError> {
        let runner = self.runner(&job.target)?;
        let limits = TrshLimits {
            memory_margin: self.config.memory_margin,
            ..TrshLimits::for_target(runner.target())
        };
        let task = JobTask {
            runner,
            renderer: Arc::clone(&self.renderer),
            classifier: Arc::clone(&self.classifier),
            store: Arc::clone(&self.store),
            limits,
            poll_interval: self.config.poll_interval,
        };

        let (cancel, cancel_rx) = watch::channel(false);
        let label = job.label.clone();
        let job_name = job.name.clone();
        tracing::info!(
            "{} Starting job {} of {} on {}",
            job.status.symbol(),
            job.name,
            job.label,
            job.target
        );
        let task = tokio::spawn(task.run(job, cancel_rx));
        Ok(JobHandle {
            label,
            job_name,
            cancel,
            task,
        })
    }

    /// Delete orphaned engine jobs on every target. Returns deleted ids per target.
    pub async fn sweep_orphans(&self, convention: &NamingConvention) -> BTreeMap<String, Vec<String>> {
        let mut swept = BTreeMap::new();
        for (name, runner) in &self.runners {
            match runner.sweep_orphans(convention).await {
                Ok(ids) => {
                    swept.insert(name.clone(), ids);
                }
                Err(e) => tracing::warn!("Could not sweep orphaned jobs on {}: {}", name, e),
            }
        }
        swept
    }
}

enum Step {
    Resubmit,
    Finished(Outcome),
}

/// Everything one job task owns.
struct JobTask<C> {
    runner: Arc<JobRunner<C>>,
    renderer: Arc<dyn InputRenderer>,
    classifier: Arc<dyn LogClassifier>,
    store: Arc<Mutex<HistoryStore>>,
    limits: TrshLimits,
    poll_interval: Duration,
}

impl<C: ExecutionChannel> JobTask<C> {
    async fn run(self, mut job: Job, mut cancel: watch::Receiver<bool>) -> JobOutcome {
        let started = Instant::now();
        self.restore_history(&mut job).await;

        let mut last_evidence = None;
        let outcome = loop {
            match self.attempt(&mut job, &mut cancel, &mut last_evidence).await {
                Step::Resubmit => continue,
                Step::Finished(outcome) => break outcome,
            }
        };

        self.persist_outcome(&job, &outcome).await;
        tracing::info!(
            "{} Job {} of {} finished after {}: {:?}",
            job.status.symbol(),
            job.name,
            job.label,
            format_duration(started.elapsed().as_secs()),
            outcome
        );
        JobOutcome {
            label: job.label,
            job_name: job.name,
            outcome,
            last_evidence,
            history: job.history,
        }
    }

    /// One submission of the job, followed by troubleshooting if it failed.
    async fn attempt(
        &self,
        job: &mut Job,
        cancel: &mut watch::Receiver<bool>,
        last_evidence: &mut Option<ErrorEvidence>,
    ) -> Step {
        if is_cancelled(cancel) {
            return Step::Finished(Outcome::Failed(FailureReason::Cancelled));
        }

        let walltime = self.runner.walltime(job);
        let request = RenderRequest {
            job,
            target: self.runner.target(),
            walltime: &walltime,
            submit_filename: &self.runner.commands().submit_filename,
        };
        let rendered = match self.renderer.render(&request) {
            Ok(rendered) => rendered,
            Err(reason) => {
                let e = RunError::Render {
                    job: job.name.clone(),
                    reason,
                };
                tracing::error!("{}", e);
                return Step::Finished(Outcome::Failed(FailureReason::Render(e.to_string())));
            }
        };

        if let Err(e) = self.runner.submit(job, &rendered).await {
            job.status = JobStatus::Errored;
            let reason = match e {
                RunError::Scheduler(SchedulerError::SubmissionFailed { .. }) => {
                    FailureReason::SubmissionFailed(e.to_string())
                }
                e => FailureReason::Transport(e.to_string()),
            };
            return Step::Finished(Outcome::Failed(reason));
        }
        if is_cancelled(cancel) {
            self.runner.cancel(job).await;
            return Step::Finished(Outcome::Failed(FailureReason::Cancelled));
        }

        let status = match self.monitor(job, cancel).await {
            Ok(Some(status)) => status,
            Ok(None) => {
                tracing::info!("Cancelling job {} of {}", job.name, job.label);
                self.runner.cancel(job).await;
                return Step::Finished(Outcome::Failed(FailureReason::Cancelled));
            }
            Err(e) => {
                tracing::error!("Lost track of job {} of {}: {}", job.name, job.label, e);
                job.status = JobStatus::Errored;
                return Step::Finished(Outcome::Failed(FailureReason::Transport(e.to_string())));
            }
        };

        let (decision, evidence) = match status {
            JobStatus::Done => match self.inspect_output(job).await {
                Ok(None) => (troubleshoot_missing_output(job), None),
                Ok(Some(Classification::Done)) => return Step::Finished(Outcome::Succeeded),
                Ok(Some(Classification::Errored(evidence))) => {
                    tracing::warn!(
                        "Job {} of {} failed: {} ({})",
                        job.name,
                        job.label,
                        evidence.message,
                        evidence
                            .keywords
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                    let decision = decide(job, &evidence, &self.limits);
                    *last_evidence = Some(evidence.clone());
                    match decision {
                        Ok(decision) => (decision, Some(evidence)),
                        Err(e @ TrshError::SpeciesError { .. }) => {
                            return Step::Finished(Outcome::Failed(FailureReason::SpeciesError(
                                e.to_string(),
                            )));
                        }
                        Err(e @ TrshError::UserActionRequired { .. }) => {
                            let reason = e.to_string();
                            if let TrshError::UserActionRequired { history, .. } = e {
                                job.history = history;
                            }
                            return Step::Finished(Outcome::Failed(
                                FailureReason::UserActionRequired(reason),
                            ));
                        }
                    }
                }
                Err(e) if e.is_transport() => {
                    return Step::Finished(Outcome::Failed(FailureReason::Transport(e.to_string())));
                }
                Err(e) => return Step::Finished(Outcome::Failed(FailureReason::Internal(e.to_string()))),
            },
            status => (troubleshoot_server(job, &status), None),
        };

        self.resubmit_with(job, decision, evidence.as_ref()).await
    }

    /// Apply a remedy and persist the history ahead of the next submission.
    async fn resubmit_with(
        &self,
        job: &mut Job,
        decision: Decision,
        evidence: Option<&ErrorEvidence>,
    ) -> Step {
        if decision.remedy.is_exhausted() {
            tracing::warn!(
                "Troubleshooting exhausted for job {} of {} ({:?})",
                job.name,
                job.label,
                job.history.to_vec()
            );
            return Step::Finished(Outcome::Exhausted);
        }

        job.history = decision.history;
        apply(job, &decision.remedy);
        if let Err(e) = self.record_remedy(job, &decision.remedy, evidence).await {
            tracing::error!(
                "Not resubmitting job {} of {}: {}",
                job.name,
                job.label,
                e
            );
            return Step::Finished(Outcome::Failed(FailureReason::Persistence(e.to_string())));
        }
        if let Some(category) = decision.remedy.category() {
            tracing::info!(
                "Resubmitting job {} of {} after {}",
                job.name,
                job.label,
                category
            );
        }
        job.reset_for_resubmission();
        Step::Resubmit
    }

    /// Poll until the job leaves the queue. `Ok(None)` means cancelled.
    async fn monitor(
        &self,
        job: &mut Job,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<Option<JobStatus>, RunError> {
        let mut ticker = interval(self.poll_interval.max(Duration::from_millis(1)));
        // Skip the first tick (fires immediately)
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = wait_cancelled(cancel) => return Ok(None),
            }
            // The status query backs off on stderr, so it races cancellation too
            let status = tokio::select! {
                status = self.runner.poll(job) => status?,
                _ = wait_cancelled(cancel) => return Ok(None),
            };
            if is_cancelled(cancel) {
                return Ok(None);
            }
            if status.is_terminal() {
                return Ok(Some(status));
            }
        }
    }

    /// Fetch and classify the program output. `Ok(None)` if there is none.
    async fn inspect_output(&self, job: &Job) -> Result<Option<Classification>, RunError> {
        let Some(path) = self.runner.fetch_output(job).await? else {
            return Ok(None);
        };
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| RunError::Io {
                path: path.clone(),
                source,
            })?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        Ok(Some(self.classifier.classify(&lines, job.kind, &job.software)))
    }

    /// Pick up history saved by an earlier run of the same job.
    async fn restore_history(&self, job: &mut Job) {
        if !job.history.is_empty() {
            return;
        }
        let store = self.store.lock().await;
        match store.load(&job.label) {
            Ok(saved) => {
                let history = saved.history_of(&job.name);
                if !history.is_empty() {
                    tracing::info!(
                        "Restored troubleshooting history of job {} of {}: {:?}",
                        job.name,
                        job.label,
                        history.to_vec()
                    );
                    job.history = history;
                }
            }
            Err(e) => tracing::warn!("Could not load history of {}: {}", job.label, e),
        }
    }

    async fn record_remedy(
        &self,
        job: &Job,
        remedy: &Remedy,
        evidence: Option<&ErrorEvidence>,
    ) -> Result<(), RunError> {
        let store = self.store.lock().await;
        let mut saved = store.load(&job.label)?;
        saved.record_remedy(job, remedy, evidence);
        store.save(&saved)?;
        Ok(())
    }

    async fn persist_outcome(&self, job: &Job, outcome: &Outcome) {
        let store = self.store.lock().await;
        let result = store.load(&job.label).and_then(|mut saved| {
            saved.mark_finished(job, outcome.record_status());
            store.save(&saved)
        });
        if let Err(e) = result {
            tracing::warn!("Could not save outcome of job {} of {}: {}", job.name, job.label, e);
        }
    }
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Resolves once cancellation is requested. Never resolves if the handle
/// was dropped without cancelling.
async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}
