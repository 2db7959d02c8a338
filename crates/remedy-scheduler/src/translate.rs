//! Canonical status translation and queue/acknowledgement parsing.

use crate::commands::Scheduler;
use crate::types::{CanonicalStatus, QueueEntry, SchedulerError};
use remedy_core::SchedulerKind;
use remedy_parsers::{contains_token, whitespace_field};

/// Column holding the state code in both OGE and Slurm listings.
const STATE_FIELD: usize = 4;

/// Translate a queue listing into the canonical status of `job_id`.
///
/// A job the scheduler no longer lists is `Done`; whether the program
/// itself succeeded is decided later from its output.
pub fn translate_status(
    job_id: &str,
    listing: &[String],
    scheduler: SchedulerKind,
) -> CanonicalStatus {
    let Some(line) = listing.iter().find(|line| contains_token(line, job_id)) else {
        return CanonicalStatus::Done;
    };

    let state = whitespace_field(line, STATE_FIELD).unwrap_or_default();
    if scheduler.is_active_state(state) {
        return CanonicalStatus::Running;
    }

    tracing::debug!("job {} is in scheduler state '{}': {}", job_id, state, line);
    match scheduler.node_suffix(line) {
        Some(node) => CanonicalStatus::ErroredOnNode(node),
        None => CanonicalStatus::Errored,
    }
}

/// Parse the job lines of a queue listing.
pub fn parse_queue(listing: &[String], scheduler: SchedulerKind) -> Vec<QueueEntry> {
    let mut entries = Vec::new();

    for line in listing.iter().skip(scheduler.header_lines()) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() <= STATE_FIELD {
            tracing::warn!("skipping short queue line: {}", line);
            continue;
        }
        entries.push(QueueEntry {
            job_id: fields[0].to_string(),
            name: fields[2].to_string(),
            user: fields[3].to_string(),
            state: fields[STATE_FIELD].to_string(),
        });
    }

    entries
}

/// Extract the scheduler-assigned job ID from a submit command's output.
///
/// Any stderr output, an empty stdout, or a first line without the word
/// "submitted" means the scheduler did not accept the job.
pub fn parse_submission(
    stdout: &[String],
    stderr: &[String],
    scheduler: SchedulerKind,
) -> Result<String, SchedulerError> {
    let failed = || SchedulerError::SubmissionFailed {
        stdout: stdout.to_vec(),
        stderr: stderr.to_vec(),
    };

    if !stderr.iter().all(|line| line.trim().is_empty()) {
        return Err(failed());
    }
    let first = stdout.first().ok_or_else(failed)?;
    if !first.to_lowercase().contains("submitted") {
        return Err(failed());
    }

    let id = whitespace_field(first, scheduler.ack_id_index()).ok_or_else(failed)?;
    if !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(SchedulerError::ParseError(format!(
            "unexpected job id '{}' in '{}'",
            id, first
        )));
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    const OGE_LISTING: &str = "\
job-ID  prior   name       user         state submit/start at     queue                          slots ja-task-ID
-----------------------------------------------------------------------------------------------------------------
540420 0.45326 a1340    alice       r     10/26/2018 11:08:30 long1@node18.cluster
540421 0.45326 a1341    alice       qw    10/26/2018 11:08:30
540422 0.45326 a1342    alice       Eqw   10/26/2018 11:08:30 long1@node07.cluster
540423 0.45326 a1343    alice       Eqw   10/26/2018 11:08:30";

    const SLURM_LISTING: &str = "\
JOBID PARTITION     NAME     USER ST       TIME  NODES NODELIST(REASON)
14428     debug a1371   alice  R 50-04:04:46      1 node06
14429     debug a1372   alice  PD       0:00      1 (Resources)
14430     debug a1373   alice  F        1:00      1 node11
14431     debug analysis   bob  R        1:00      1 node02";

    #[test]
    fn test_translate_running_codes() {
        let oge = lines(OGE_LISTING);
        assert_eq!(translate_status("540420", &oge, SchedulerKind::Oge), CanonicalStatus::Running);
        assert_eq!(translate_status("540421", &oge, SchedulerKind::Oge), CanonicalStatus::Running);

        let slurm = lines(SLURM_LISTING);
        assert_eq!(translate_status("14428", &slurm, SchedulerKind::Slurm), CanonicalStatus::Running);
        assert_eq!(translate_status("14429", &slurm, SchedulerKind::Slurm), CanonicalStatus::Running);

        for code in ["r", "R", "qw", "QW", "Qw", "t", "T"] {
            let listing = vec![format!("77 0.5 a1 alice {} 10/26/2018 11:08:30", code)];
            assert_eq!(
                translate_status("77", &listing, SchedulerKind::Oge),
                CanonicalStatus::Running
            );
        }
    }

    #[test]
    fn test_translate_absent_is_done() {
        let slurm = lines(SLURM_LISTING);
        assert_eq!(translate_status("99999", &slurm, SchedulerKind::Slurm), CanonicalStatus::Done);
        assert_eq!(translate_status("1442", &slurm, SchedulerKind::Slurm), CanonicalStatus::Done);
        assert_eq!(translate_status("1", &[], SchedulerKind::Oge), CanonicalStatus::Done);
    }

    #[test]
    fn test_translate_errored_on_node() {
        let oge = lines(OGE_LISTING);
        assert_eq!(
            translate_status("540422", &oge, SchedulerKind::Oge),
            CanonicalStatus::ErroredOnNode("07".to_string())
        );
        assert_eq!(translate_status("540423", &oge, SchedulerKind::Oge), CanonicalStatus::Errored);

        let slurm = lines(SLURM_LISTING);
        assert_eq!(
            translate_status("14430", &slurm, SchedulerKind::Slurm),
            CanonicalStatus::ErroredOnNode("11".to_string())
        );
    }

    #[test]
    fn test_translate_is_idempotent() {
        let slurm = lines(SLURM_LISTING);
        let first = translate_status("14430", &slurm, SchedulerKind::Slurm);
        let second = translate_status("14430", &slurm, SchedulerKind::Slurm);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_queue() {
        let oge = parse_queue(&lines(OGE_LISTING), SchedulerKind::Oge);
        assert_eq!(oge.len(), 4);
        assert_eq!(oge[0].job_id, "540420");
        assert_eq!(oge[0].name, "a1340");
        assert_eq!(oge[0].user, "alice");

        let slurm = parse_queue(&lines(SLURM_LISTING), SchedulerKind::Slurm);
        assert_eq!(slurm.len(), 4);
        assert_eq!(slurm[3].name, "analysis");
        assert_eq!(slurm[3].user, "bob");
        assert_eq!(slurm[1].state, "PD");
    }

    #[test]
    fn test_parse_submission() {
        let oge = lines("Your job 540420 (\"a1340\") has been submitted");
        assert_eq!(parse_submission(&oge, &[], SchedulerKind::Oge).unwrap(), "540420");

        let slurm = lines("Submitted batch job 14428");
        assert_eq!(parse_submission(&slurm, &[], SchedulerKind::Slurm).unwrap(), "14428");
    }

    #[test]
    fn test_parse_submission_failures() {
        let stderr = lines("sbatch: error: Batch job submission failed");
        assert!(matches!(
            parse_submission(&[], &stderr, SchedulerKind::Slurm),
            Err(SchedulerError::SubmissionFailed { .. })
        ));
        assert!(matches!(
            parse_submission(&[], &[], SchedulerKind::Slurm),
            Err(SchedulerError::SubmissionFailed { .. })
        ));
        let stdout = lines("Queue is full");
        assert!(matches!(
            parse_submission(&stdout, &[], SchedulerKind::Oge),
            Err(SchedulerError::SubmissionFailed { .. })
        ));
        let stdout = lines("Submitted batch job");
        assert!(matches!(
            parse_submission(&stdout, &[], SchedulerKind::Slurm),
            Err(SchedulerError::SubmissionFailed { .. })
        ));
    }
}
