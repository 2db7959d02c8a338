use chrono::{DateTime, Utc};
use remedy_core::{Job, TroubleshootingHistory};
use remedy_trsh::{ErrorEvidence, Remedy};
use serde::{Deserialize, Serialize};

/// Where a job's troubleshooting ended up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RecordStatus {
    #[default]
    Running,
    Succeeded,
    Failed,
    Exhausted,
}

/// One remedy taken for a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemedyEntry {
    pub at: DateTime<Utc>,
    pub remedy: Remedy,
    /// Evidence that led to the remedy; absent for server-level failures.
    pub evidence: Option<ErrorEvidence>,
}

/// Troubleshooting record of a single job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job name (e.g. `a4521`)
    pub job_name: String,

    /// Scheduler id of the latest submission.
    pub scheduler_id: Option<String>,

    pub history: TroubleshootingHistory,

    pub remedies: Vec<RemedyEntry>,

    pub status: RecordStatus,

    pub last_updated: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            scheduler_id: None,
            history: TroubleshootingHistory::default(),
            remedies: Vec::new(),
            status: RecordStatus::Running,
            last_updated: Utc::now(),
        }
    }

    pub fn last_remedy(&self) -> Option<&RemedyEntry> {
        self.remedies.last()
    }
}

/// Everything persisted for one species/task label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelHistory {
    pub label: String,

    /// When the label was first recorded.
    pub first_seen: DateTime<Utc>,

    pub last_updated: DateTime<Utc>,

    pub jobs: Vec<JobRecord>,
}

impl LabelHistory {
    pub fn new(label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            label: label.into(),
            first_seen: now,
            last_updated: now,
            jobs: Vec::new(),
        }
    }

    pub fn job(&self, job_name: &str) -> Option<&JobRecord> {
        self.jobs.iter().find(|r| r.job_name == job_name)
    }

    fn job_mut(&mut self, job_name: &str) -> &mut JobRecord {
        match self.jobs.iter().position(|r| r.job_name == job_name) {
            Some(idx) => &mut self.jobs[idx],
            None => {
                self.jobs.push(JobRecord::new(job_name));
                let last = self.jobs.len() - 1;
                &mut self.jobs[last]
            }
        }
    }

    /// Record a remedy about to be applied to `job`.
    ///
    /// The stored history is taken from the job, so call this after the
    /// decision's history has been assigned.
    pub fn record_remedy(&mut self, job: &Job, remedy: &Remedy, evidence: Option<&ErrorEvidence>) {
        let now = Utc::now();
        let record = self.job_mut(&job.name);
        record.scheduler_id = job.scheduler_id.clone();
        record.history = job.history.clone();
        record.remedies.push(RemedyEntry {
            at: now,
            remedy: remedy.clone(),
            evidence: evidence.cloned(),
        });
        record.last_updated = now;
        self.last_updated = now;
    }

    /// Mark a job as finished with the given status.
    pub fn mark_finished(&mut self, job: &Job, status: RecordStatus) {
        let now = Utc::now();
        let record = self.job_mut(&job.name);
        record.scheduler_id = job.scheduler_id.clone();
        record.history = job.history.clone();
        record.status = status;
        record.last_updated = now;
        self.last_updated = now;
    }

    /// History of a job, or an empty one if the job was never recorded.
    pub fn history_of(&self, job_name: &str) -> TroubleshootingHistory {
        self.job(job_name)
            .map(|r| r.history.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remedy_core::{JobKind, RemedyCategory, ResourceRequest};

    fn job() -> Job {
        Job::new(
            "ethanol",
            4521,
            "local",
            "gaussian",
            JobKind::Opt,
            "b3lyp/6-31g",
            ResourceRequest::default(),
        )
    }

    #[test]
    fn test_record_remedy_creates_job_record() {
        let mut job = job();
        job.history.insert(RemedyCategory::ChangeNode);
        let remedy = Remedy::Resubmit {
            category: RemedyCategory::ChangeNode,
            discard_checkpoint: false,
            exclude_node: Some("18".to_string()),
        };

        let mut history = LabelHistory::new("ethanol");
        history.record_remedy(&job, &remedy, None);
        history.record_remedy(&job, &remedy, None);

        assert_eq!(history.jobs.len(), 1);
        let record = history.job("a4521").unwrap();
        assert_eq!(record.remedies.len(), 2);
        assert_eq!(record.last_remedy().unwrap().remedy, remedy);
        assert!(history.history_of("a4521").contains(RemedyCategory::ChangeNode));
    }

    #[test]
    fn test_mark_finished() {
        let job = job();
        let mut history = LabelHistory::new("ethanol");
        history.mark_finished(&job, RecordStatus::Exhausted);
        assert_eq!(history.job("a4521").unwrap().status, RecordStatus::Exhausted);
        assert!(history.history_of("a9999").is_empty());
    }
}
