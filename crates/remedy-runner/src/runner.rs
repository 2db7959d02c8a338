//! Lifecycle operations on one target: submit, poll, cancel, sweep.

use crate::collab::RenderedJob;
use crate::error::RunError;
use crate::output::output_file_name;
use camino::Utf8PathBuf;
use remedy_channel::{Backoff, ExecutionChannel, RetryPolicy, UploadSource, retry};
use remedy_core::{Job, JobStatus, Target};
use remedy_scheduler::{
    CommandSet, NamingConvention, Scheduler, parse_queue, parse_submission, translate_status,
};
use std::sync::Arc;
use std::time::Duration;

/// Default budget for status queries answering on stderr.
pub const STATUS_RETRY: RetryPolicy = RetryPolicy::new(30, Backoff::Linear(Duration::from_secs(60)));

/// Drives jobs on a single target through its channel.
pub struct JobRunner<C> {
    target: Arc<Target>,
    channel: C,
    commands: CommandSet,
    status_retry: RetryPolicy,
}

impl<C: ExecutionChannel> JobRunner<C> {
    pub fn new(target: Arc<Target>, channel: C) -> Self {
        let commands = CommandSet::for_target(&target);
        Self {
            target,
            channel,
            commands,
            status_retry: STATUS_RETRY,
        }
    }

    pub fn with_status_retry(mut self, policy: RetryPolicy) -> Self {
        self.status_retry = policy;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    /// Wall-clock limit of a job formatted for this target's scheduler.
    pub fn walltime(&self, job: &Job) -> String {
        self.target.scheduler.format_walltime(job.resources.wall_time)
    }

    /// Upload the rendered files and submit the job from its remote directory.
    ///
    /// A missing acknowledgement marks the job `Errored`; it is not retried here.
    pub async fn submit(&self, job: &mut Job, rendered: &RenderedJob) -> Result<(), RunError> {
        let dir = job.remote_dir.clone();
        self.channel
            .upload(
                &dir.join(&rendered.input_filename),
                UploadSource::Content(&rendered.input),
            )
            .await?;
        self.channel
            .upload(
                &dir.join(&self.commands.submit_filename),
                UploadSource::Content(&rendered.submit_script),
            )
            .await?;

        let output = self
            .channel
            .execute(&self.commands.submit_job(), Some(&dir))
            .await?;
        match parse_submission(&output.stdout, &output.stderr, self.target.scheduler) {
            Ok(id) => {
                tracing::info!(
                    "Submitted job {} of {} on {} as {}",
                    job.name,
                    job.label,
                    self.target.name,
                    id
                );
                job.scheduler_id = Some(id);
                job.status = JobStatus::Running;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Could not submit job {} of {}: {}", job.name, job.label, e);
                job.status = JobStatus::Errored;
                Err(e.into())
            }
        }
    }

    /// Queue listing of the target user's jobs.
    ///
    /// Output on stderr is treated as a connectivity problem and retried.
    pub async fn queue_listing(&self) -> Result<Vec<String>, RunError> {
        let command = self.commands.status_query(&self.target.username);
        let what = format!("status query on {}", self.target.name);
        let (channel, command) = (&self.channel, command.as_str());
        let result = retry(&self.status_retry, &what, |_| async move {
            match channel.execute(command, None).await {
                Ok(output) if !output.stderr.is_empty() => Err(output.stderr.join("\n")),
                Ok(output) => Ok(Ok(output.stdout)),
                Err(e) => Ok(Err(e)),
            }
        })
        .await;

        match result {
            Ok(Ok(listing)) => Ok(listing),
            Ok(Err(e)) => Err(e.into()),
            Err(exhausted) => Err(RunError::StatusQueryExhausted {
                target: self.target.name.clone(),
                attempts: exhausted.attempts,
                stderr: exhausted.last_error,
            }),
        }
    }

    /// Refresh a job's status from the queue. Repeating this over an
    /// unchanged queue gives the same answer.
    pub async fn poll(&self, job: &mut Job) -> Result<JobStatus, RunError> {
        let id = job
            .scheduler_id
            .clone()
            .ok_or_else(|| RunError::NotSubmitted(job.name.clone()))?;
        let listing = self.queue_listing().await?;
        let status: JobStatus = translate_status(&id, &listing, self.target.scheduler).into();
        if status != job.status {
            tracing::info!(
                "{} Job {} ({}) of {} is {}",
                status.symbol(),
                job.name,
                id,
                job.label,
                status
            );
        }
        job.status = status.clone();
        Ok(status)
    }

    /// Ask the scheduler to delete a job. Failures are logged, not returned.
    pub async fn cancel(&self, job: &Job) {
        match job.scheduler_id.as_deref() {
            Some(id) => {
                self.delete(id).await;
            }
            None => tracing::debug!("Job {} has no scheduler id, nothing to cancel", job.name),
        }
    }

    async fn delete(&self, job_id: &str) -> bool {
        match self
            .channel
            .execute(&self.commands.delete_job(job_id), None)
            .await
        {
            Ok(output) if output.stderr.is_empty() => {
                tracing::info!("Deleted job {} on {}", job_id, self.target.name);
                true
            }
            Ok(output) => {
                tracing::warn!(
                    "Deleting job {} on {} reported: {}",
                    job_id,
                    self.target.name,
                    output.stderr.join(" ")
                );
                false
            }
            Err(e) => {
                tracing::warn!("Could not delete job {} on {}: {}", job_id, self.target.name, e);
                false
            }
        }
    }

    /// Scheduler ids of all jobs the target user has queued.
    pub async fn list_job_ids(&self) -> Result<Vec<String>, RunError> {
        let listing = self.queue_listing().await?;
        Ok(parse_queue(&listing, self.target.scheduler)
            .into_iter()
            .filter(|entry| entry.user == self.target.username)
            .map(|entry| entry.job_id)
            .collect())
    }

    /// Delete the user's queued jobs whose name follows the engine's naming
    /// convention. Returns the ids that were deleted.
    pub async fn sweep_orphans(
        &self,
        convention: &NamingConvention,
    ) -> Result<Vec<String>, RunError> {
        let listing = self.queue_listing().await?;
        let mut deleted = Vec::new();
        for entry in parse_queue(&listing, self.target.scheduler) {
            if entry.user != self.target.username || !convention.matches(&entry.name) {
                continue;
            }
            if self.delete(&entry.job_id).await {
                deleted.push(entry.job_id);
            }
        }
        if !deleted.is_empty() {
            tracing::info!(
                "Deleted {} orphaned jobs on {}",
                deleted.len(),
                self.target.name
            );
        }
        Ok(deleted)
    }

    /// Download the program's output into the job's local directory.
    ///
    /// Returns `Ok(None)` if the program never wrote its output file.
    pub async fn fetch_output(&self, job: &Job) -> Result<Option<Utf8PathBuf>, RunError> {
        let file_name = output_file_name(&job.software)
            .ok_or_else(|| RunError::UnknownSoftware(job.software.clone()))?;
        let remote = job.remote_dir.join(file_name);
        let Some(modified) = self.channel.last_modified(&remote).await? else {
            tracing::warn!(
                "Output file {} of job {} ({}) is missing on {}",
                remote,
                job.name,
                job.label,
                self.target.name
            );
            return Ok(None);
        };
        tracing::debug!("{} last modified at {}", remote, modified);

        let local = job.local_dir.join(file_name);
        self.channel.download(&remote, &local).await?;
        Ok(Some(local))
    }
}
