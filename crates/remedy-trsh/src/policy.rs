//! The decision policy.
//!
//! Rules are evaluated in a fixed order and the first one that applies wins.
//! A rule applies only if its remedy category is not already in the job's
//! history, so every job runs out of remedies after finitely many attempts.

use crate::directives;
use crate::error::TrshError;
use crate::evidence::{ErrorEvidence, ErrorKeyword};
use crate::remedy::{Decision, Remedy};
use remedy_core::{Job, JobKind, JobStatus, RemedyCategory, Target};

/// Level of theory used when a job falls back to a composite method.
pub const COMPOSITE_FALLBACK_LEVEL: &str = "cbs-qb3";

const DEFAULT_MEMORY_MARGIN: f64 = 1.02;

/// Resource bounds the engine must respect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrshLimits {
    /// Largest total job memory the target accepts, in MB
    pub max_job_memory_mb: Option<u64>,
    /// Most cpus a job may request on the target
    pub max_cpus: Option<u32>,
    /// Multiplier applied to a program's own memory estimate
    pub memory_margin: f64,
}

impl Default for TrshLimits {
    fn default() -> Self {
        Self {
            max_job_memory_mb: None,
            max_cpus: None,
            memory_margin: DEFAULT_MEMORY_MARGIN,
        }
    }
}

impl TrshLimits {
    pub fn for_target(target: &Target) -> Self {
        Self {
            max_job_memory_mb: target.max_job_memory_mb,
            max_cpus: target.max_cpus,
            ..Self::default()
        }
    }

    pub fn with_max_job_memory_mb(mut self, cap: u64) -> Self {
        self.max_job_memory_mb = Some(cap);
        self
    }

    fn clamp_cpus(&self, cpus: u32) -> u32 {
        self.max_cpus.map_or(cpus, |max| cpus.min(max))
    }

    fn required_memory_mb(&self, cpus: u32, per_core_mb: u64) -> u64 {
        (f64::from(cpus) * per_core_mb as f64 * self.memory_margin).ceil() as u64
    }

    fn cpus_within(&self, cap_mb: u64, per_core_mb: u64) -> u32 {
        let per_core = per_core_mb as f64 * self.memory_margin;
        if per_core <= 0.0 {
            return 0;
        }
        (cap_mb as f64 / per_core).floor() as u32
    }
}

/// Pick the next remedy for a job that failed with `evidence`.
pub fn decide(job: &Job, evidence: &ErrorEvidence, limits: &TrshLimits) -> Result<Decision, TrshError> {
    let history = &job.history;
    let tried = |category: RemedyCategory| history.contains(category);

    if evidence.has(&ErrorKeyword::Multiplicity) {
        return Err(TrshError::SpeciesError {
            label: job.label.clone(),
            message: evidence.message.clone(),
        });
    }

    if evidence.has(&ErrorKeyword::Unknown) && !tried(RemedyCategory::ChangeNode) {
        return Ok(Decision::take(
            Remedy::Resubmit {
                category: RemedyCategory::ChangeNode,
                discard_checkpoint: false,
                exclude_node: None,
            },
            history,
        ));
    }

    if evidence.has(&ErrorKeyword::CheckFile) && !tried(RemedyCategory::RemoveCheckpoint) {
        return Ok(Decision::take(
            Remedy::Resubmit {
                category: RemedyCategory::RemoveCheckpoint,
                discard_checkpoint: true,
                exclude_node: None,
            },
            history,
        ));
    }

    if evidence.has(&ErrorKeyword::InternalCoordinateError)
        && !tried(RemedyCategory::CartesianCoordinates)
        && let Some(directive) = directives::cartesian_coordinates(&job.software)
    {
        return Ok(directive_decision(RemedyCategory::CartesianCoordinates, directive, history));
    }

    if evidence.has(&ErrorKeyword::BasisSet) {
        if tried(RemedyCategory::BasisSet) {
            return Ok(Decision::exhausted(history));
        }
        let mut history = history.clone();
        history.insert(RemedyCategory::BasisSet);
        return Err(TrshError::UserActionRequired {
            label: job.label.clone(),
            reason: format!("basis set error in {}: {}", job.software, evidence.message),
            history,
        });
    }

    if (evidence.has(&ErrorKeyword::Memory) || evidence.has(&ErrorKeyword::MaxTotalJobMemory))
        && let Some(decision) = memory_decision(job, evidence, limits)
    {
        return Ok(decision);
    }

    if evidence.has(&ErrorKeyword::Cpu)
        && !tried(RemedyCategory::CpuLimit)
        && let Some(cpus) = evidence
            .max_usable_cpus()
            .map(|n| limits.clamp_cpus(n))
            .filter(|n| *n >= 1)
    {
        tracing::info!(
            "Job {} of {} can use at most {} cpus, was given {}",
            job.name,
            job.label,
            cpus,
            job.resources.cpus
        );
        return Ok(Decision::take(
            Remedy::Resources {
                category: RemedyCategory::CpuLimit,
                cpus,
                memory_mb: job.resources.memory_mb,
            },
            history,
        ));
    }

    if evidence.has(&ErrorKeyword::MaxOptCycles)
        && !tried(RemedyCategory::MaxCycles)
        && let Some(directive) = directives::max_cycles(&job.software)
    {
        return Ok(directive_decision(RemedyCategory::MaxCycles, directive, history));
    }

    if evidence.has(&ErrorKeyword::Scf) {
        let next = directives::scf_ladder(&job.software)
            .iter()
            .find(|(strategy, _)| !tried(RemedyCategory::Scf(*strategy)));
        if let Some((strategy, directive)) = next {
            return Ok(directive_decision(RemedyCategory::Scf(*strategy), directive, history));
        }
    }

    if !tried(RemedyCategory::IntegralAccuracy)
        && let Some(directive) = directives::integral_accuracy(&job.software)
    {
        return Ok(directive_decision(RemedyCategory::IntegralAccuracy, directive, history));
    }

    if !tried(RemedyCategory::CompositeFallback) && composite_eligible(job) {
        tracing::info!(
            "Falling back to {} for job {} of {} (was {})",
            COMPOSITE_FALLBACK_LEVEL,
            job.name,
            job.label,
            job.level_of_theory
        );
        return Ok(Decision::take(
            Remedy::CompositeFallback {
                level: COMPOSITE_FALLBACK_LEVEL.to_string(),
            },
            history,
        ));
    }

    tracing::warn!(
        "Could not troubleshoot job {} of {}; tried {:?}",
        job.name,
        job.label,
        history.to_vec()
    );
    Ok(Decision::exhausted(history))
}

fn directive_decision(
    category: RemedyCategory,
    directive: &str,
    history: &remedy_core::TroubleshootingHistory,
) -> Decision {
    Decision::take(
        Remedy::Directive {
            category,
            directive: directive.to_string(),
        },
        history,
    )
}

/// Memory handling. Returns `None` when no memory rule applies.
fn memory_decision(job: &Job, evidence: &ErrorEvidence, limits: &TrshLimits) -> Option<Decision> {
    let history = &job.history;
    let cpus = job.resources.cpus;
    let cap_hit = evidence.has(&ErrorKeyword::MaxTotalJobMemory);

    // A zero estimate is no estimate
    let Some(per_core_mb) = evidence.per_core_memory_mb().filter(|mb| *mb > 0) else {
        // No estimate from the program: double the request once, within the cap
        if cap_hit || history.contains(RemedyCategory::Memory) {
            return None;
        }
        let doubled = job.resources.memory_mb.saturating_mul(2);
        let memory_mb = limits
            .max_job_memory_mb
            .map_or(doubled, |cap| doubled.min(cap));
        if memory_mb <= job.resources.memory_mb {
            return None;
        }
        return Some(Decision::take(
            Remedy::Resources {
                category: RemedyCategory::Memory,
                cpus,
                memory_mb,
            },
            history,
        ));
    };

    let required = limits.required_memory_mb(cpus, per_core_mb);
    if required == 0 {
        return None;
    }
    let fits = limits.max_job_memory_mb.is_none_or(|cap| required <= cap);
    if !cap_hit && fits {
        if history.contains(RemedyCategory::Memory) {
            return None;
        }
        tracing::info!(
            "Increasing memory of job {} of {} from {} MB to {} MB",
            job.name,
            job.label,
            job.resources.memory_mb,
            required
        );
        return Some(Decision::take(
            Remedy::Resources {
                category: RemedyCategory::Memory,
                cpus,
                memory_mb: required,
            },
            history,
        ));
    }

    if history.contains(RemedyCategory::CpuRebalance) {
        return None;
    }
    let cap = limits.max_job_memory_mb.unwrap_or(job.resources.memory_mb);
    let new_cpus = limits.clamp_cpus(limits.cpus_within(cap, per_core_mb));
    if new_cpus < 1 {
        tracing::warn!(
            "Not enough memory for job {} of {}: {} MB per core exceeds the {} MB cap",
            job.name,
            job.label,
            per_core_mb,
            cap
        );
        return Some(Decision::exhausted(history));
    }
    tracing::info!(
        "Reducing cpus of job {} of {} from {} to {} to fit {} MB",
        job.name,
        job.label,
        cpus,
        new_cpus,
        cap
    );
    Some(Decision::take(
        Remedy::Resources {
            category: RemedyCategory::CpuRebalance,
            cpus: new_cpus,
            memory_mb: limits.required_memory_mb(new_cpus, per_core_mb),
        },
        history,
    ))
}

fn composite_eligible(job: &Job) -> bool {
    job.software == directives::GAUSSIAN
        && !matches!(job.kind, JobKind::Scan | JobKind::Composite)
        && !job.level_of_theory.eq_ignore_ascii_case(COMPOSITE_FALLBACK_LEVEL)
}

/// Remedy for a job the scheduler reported as failed.
pub fn troubleshoot_server(job: &Job, status: &JobStatus) -> Decision {
    let history = &job.history;
    if history.contains(RemedyCategory::ChangeNode) {
        return Decision::exhausted(history);
    }
    let exclude_node = match status {
        JobStatus::ErroredOnNode(node) => Some(node.clone()),
        JobStatus::Errored => None,
        _ => return Decision::exhausted(history),
    };
    Decision::take(
        Remedy::Resubmit {
            category: RemedyCategory::ChangeNode,
            discard_checkpoint: false,
            exclude_node,
        },
        history,
    )
}

/// Remedy for a job that finished without leaving an output file.
pub fn troubleshoot_missing_output(job: &Job) -> Decision {
    if job.history.contains(RemedyCategory::OutputMissing) {
        return Decision::exhausted(&job.history);
    }
    Decision::take(
        Remedy::Resubmit {
            category: RemedyCategory::OutputMissing,
            discard_checkpoint: false,
            exclude_node: None,
        },
        &job.history,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remedy::apply;
    use remedy_core::{ResourceRequest, ScfStrategy, TroubleshootingHistory};

    const ORCA_MEMORY: &str = "Insufficient job memory. Orca suggests to increase per cpu core memory to 9718 MB.";

    fn job(software: &str, kind: JobKind, level: &str) -> Job {
        Job::new("ethanol", 7, "local", software, kind, level, ResourceRequest::default())
    }

    fn with_history(mut job: Job, history: &[RemedyCategory]) -> Job {
        job.history = history.iter().copied().collect();
        job
    }

    fn evidence(tags: &[&str]) -> ErrorEvidence {
        ErrorEvidence::from_tags(tags.iter().copied(), "", "")
    }

    fn orca_memory_job(cpus: u32) -> Job {
        let mut job = job("orca", JobKind::Sp, "DLPNO ccsd(T)");
        job.resources.cpus = cpus;
        job
    }

    #[test]
    fn test_gaussian_checkfile() {
        let job = with_history(
            job("gaussian", JobKind::Opt, "ccsd/vdz"),
            &[RemedyCategory::ChangeNode, RemedyCategory::IntegralAccuracy],
        );
        let decision = decide(&job, &evidence(&["CheckFile"]), &TrshLimits::default()).unwrap();
        assert_eq!(
            decision.remedy,
            Remedy::Resubmit {
                category: RemedyCategory::RemoveCheckpoint,
                discard_checkpoint: true,
                exclude_node: None,
            }
        );
        assert!(decision.history.contains(RemedyCategory::RemoveCheckpoint));
        // The job itself is untouched by a decision
        assert!(!job.history.contains(RemedyCategory::RemoveCheckpoint));
    }

    #[test]
    fn test_gaussian_internal_coordinates() {
        let job = job("gaussian", JobKind::Opt, "ccsd/vdz");
        let decision = decide(
            &job,
            &evidence(&["InternalCoordinateError"]),
            &TrshLimits::default(),
        )
        .unwrap();
        assert_eq!(
            decision.remedy,
            Remedy::Directive {
                category: RemedyCategory::CartesianCoordinates,
                directive: "opt=(cartesian,nosymm)".to_string(),
            }
        );
    }

    #[test]
    fn test_gaussian_generic_falls_back_to_composite() {
        let job = with_history(
            job("gaussian", JobKind::Opt, "ccsd/vdz"),
            &[RemedyCategory::ChangeNode, RemedyCategory::IntegralAccuracy],
        );
        let decision = decide(&job, &evidence(&["tmp"]), &TrshLimits::default()).unwrap();
        assert_eq!(
            decision.remedy,
            Remedy::CompositeFallback {
                level: "cbs-qb3".to_string()
            }
        );

        let mut job = job;
        apply(&mut job, &decision.remedy);
        assert_eq!(job.level_of_theory, "cbs-qb3");
        assert_eq!(job.kind, JobKind::Composite);
    }

    #[test]
    fn test_gaussian_generic_tries_integral_accuracy_first() {
        let job = job("gaussian", JobKind::Freq, "b3lyp/6-31g");
        let decision = decide(&job, &evidence(&["Unconverged"]), &TrshLimits::default()).unwrap();
        assert_eq!(
            decision.remedy,
            Remedy::Directive {
                category: RemedyCategory::IntegralAccuracy,
                directive: "int=(Acc2E=14)".to_string(),
            }
        );
    }

    #[test]
    fn test_composite_not_eligible_for_scans() {
        let job = with_history(
            job("gaussian", JobKind::Scan, "b3lyp/6-31g"),
            &[RemedyCategory::IntegralAccuracy],
        );
        let decision = decide(&job, &evidence(&["Unconverged"]), &TrshLimits::default()).unwrap();
        assert!(decision.remedy.is_exhausted());
    }

    #[test]
    fn test_qchem_max_cycles() {
        let job = with_history(job("qchem", JobKind::Opt, "wb97x-d/def2-tzvp"), &[RemedyCategory::ChangeNode]);
        let decision = decide(
            &job,
            &evidence(&["MaxOptCycles", "Unconverged"]),
            &TrshLimits::default(),
        )
        .unwrap();
        assert_eq!(
            decision.remedy,
            Remedy::Directive {
                category: RemedyCategory::MaxCycles,
                directive: "GEOM_OPT_MAX_CYCLES 250".to_string(),
            }
        );
    }

    #[test]
    fn test_qchem_scf() {
        let job = with_history(
            job("qchem", JobKind::Opt, "wb97x-d/def2-tzvp"),
            &[RemedyCategory::ChangeNode, RemedyCategory::MaxCycles],
        );
        let decision = decide(&job, &evidence(&["SCF"]), &TrshLimits::default()).unwrap();
        assert_eq!(
            decision.remedy,
            Remedy::Directive {
                category: RemedyCategory::Scf(ScfStrategy::DiisGdm),
                directive: "SCF_ALGORITHM DIIS_GDM".to_string(),
            }
        );
    }

    #[test]
    fn test_gaussian_scf_ladder_in_order() {
        let mut job = job("gaussian", JobKind::Sp, "b3lyp/6-31g");
        let limits = TrshLimits::default();
        let mut seen = Vec::new();
        for _ in 0..3 {
            let decision = decide(&job, &evidence(&["SCF"]), &limits).unwrap();
            seen.push(decision.remedy.category().unwrap());
            apply(&mut job, &decision.remedy);
        }
        assert_eq!(
            seen,
            vec![
                RemedyCategory::Scf(ScfStrategy::QuadraticConvergence),
                RemedyCategory::Scf(ScfStrategy::Damping),
                RemedyCategory::Scf(ScfStrategy::NoDiis),
            ]
        );
        assert_eq!(job.directives, vec!["scf=(NoDIIS)"]);
    }

    #[test]
    fn test_memory_increase_within_cap() {
        let job = orca_memory_job(32);
        let evidence = ErrorEvidence::new([ErrorKeyword::Memory], ORCA_MEMORY, "");
        let decision = decide(&job, &evidence, &TrshLimits::default()).unwrap();
        assert_eq!(
            decision.remedy,
            Remedy::Resources {
                category: RemedyCategory::Memory,
                cpus: 32,
                memory_mb: (32.0 * 9718.0 * 1.02_f64).ceil() as u64,
            }
        );
    }

    #[test]
    fn test_memory_cap_rebalances_cpus() {
        let job = with_history(orca_memory_job(32), &[RemedyCategory::Memory]);
        let mut evidence = ErrorEvidence::new([ErrorKeyword::Memory], ORCA_MEMORY, "");
        evidence.add_keyword(ErrorKeyword::MaxTotalJobMemory);
        let limits = TrshLimits::default().with_max_job_memory_mb(250_000);

        let decision = decide(&job, &evidence, &limits).unwrap();
        assert_eq!(
            decision.remedy,
            Remedy::Resources {
                category: RemedyCategory::CpuRebalance,
                cpus: 25,
                memory_mb: (25.0 * 9718.0 * 1.02_f64).ceil() as u64,
            }
        );
    }

    #[test]
    fn test_memory_over_cap_without_keyword_rebalances() {
        let job = orca_memory_job(32);
        let evidence = ErrorEvidence::new([ErrorKeyword::Memory], ORCA_MEMORY, "");
        let limits = TrshLimits::default().with_max_job_memory_mb(250_000);
        let decision = decide(&job, &evidence, &limits).unwrap();
        assert_eq!(decision.remedy.category(), Some(RemedyCategory::CpuRebalance));
    }

    #[test]
    fn test_memory_cap_too_small_is_exhausted() {
        let job = orca_memory_job(32);
        let mut evidence = ErrorEvidence::new([ErrorKeyword::Memory], ORCA_MEMORY, "");
        evidence.add_keyword(ErrorKeyword::MaxTotalJobMemory);
        let limits = TrshLimits::default().with_max_job_memory_mb(1000);

        let decision = decide(&job, &evidence, &limits).unwrap();
        assert!(decision.remedy.is_exhausted());
        assert!(decision.history.is_empty());
    }

    #[test]
    fn test_memory_without_estimate_doubles_once() {
        let mut job = job("molpro", JobKind::Sp, "mrci/aug-cc-pV(T+d)Z");
        job.resources.memory_mb = 32_000;
        let evidence = ErrorEvidence::new([ErrorKeyword::Memory], "insufficient memory available", "");
        let limits = TrshLimits::default().with_max_job_memory_mb(50_000);

        let decision = decide(&job, &evidence, &limits).unwrap();
        assert_eq!(
            decision.remedy,
            Remedy::Resources {
                category: RemedyCategory::Memory,
                cpus: 8,
                memory_mb: 50_000,
            }
        );

        apply(&mut job, &decision.remedy);
        assert!(decide(&job, &evidence, &limits).unwrap().remedy.is_exhausted());
    }

    #[test]
    fn test_zero_memory_estimate_never_yields_zero_memory() {
        let limits = TrshLimits::default();
        for message in [
            "Orca suggests to increase per cpu core memory to 0 MB.",
            "Orca suggests to increase per cpu core memory to 0.5 KB.",
        ] {
            let job = orca_memory_job(8);
            let evidence = ErrorEvidence::new([ErrorKeyword::Memory], message, "");
            let decision = decide(&job, &evidence, &limits).unwrap();
            assert_eq!(
                decision.remedy,
                Remedy::Resources {
                    category: RemedyCategory::Memory,
                    cpus: 8,
                    memory_mb: 2 * job.resources.memory_mb,
                }
            );
        }
    }

    #[test]
    fn test_zero_cpus_with_estimate_is_not_a_memory_remedy() {
        let job = orca_memory_job(0);
        let evidence = ErrorEvidence::new([ErrorKeyword::Memory], ORCA_MEMORY, "");
        let decision = decide(&job, &evidence, &TrshLimits::default()).unwrap();
        assert!(decision.remedy.is_exhausted());
    }

    #[test]
    fn test_cpu_limit() {
        let mut job = job("orca", JobKind::Sp, "DLPNO ccsd(T)");
        job.resources.cpus = 16;
        let evidence = ErrorEvidence::new(
            [ErrorKeyword::Cpu],
            "Orca cannot utilize cpu cores more than electron pairs in a molecule. \
             The maximum number of cpu cores can be used for this job is 10.",
            "",
        );
        let decision = decide(&job, &evidence, &TrshLimits::default()).unwrap();
        assert_eq!(
            decision.remedy,
            Remedy::Resources {
                category: RemedyCategory::CpuLimit,
                cpus: 10,
                memory_mb: job.resources.memory_mb,
            }
        );
    }

    #[test]
    fn test_multiplicity_is_species_error_regardless_of_history() {
        let histories: [&[RemedyCategory]; 2] = [&[], &[RemedyCategory::ChangeNode, RemedyCategory::Memory]];
        for history in histories {
            let job = with_history(job("gaussian", JobKind::Opt, "b3lyp/6-31g"), history);
            let result = decide(&job, &evidence(&["Multiplicity", "CheckFile"]), &TrshLimits::default());
            assert!(matches!(result, Err(TrshError::SpeciesError { .. })));
        }
    }

    #[test]
    fn test_basis_set_requires_user_action_then_exhausts() {
        let job = job("orca", JobKind::Sp, "DLPNO ccsd(T)");
        let err = decide(&job, &evidence(&["BasisSet"]), &TrshLimits::default()).unwrap_err();
        let TrshError::UserActionRequired { history, .. } = err else {
            panic!("expected UserActionRequired");
        };
        assert!(history.contains(RemedyCategory::BasisSet));

        let job = with_history(job, &history.to_vec());
        let decision = decide(&job, &evidence(&["BasisSet"]), &TrshLimits::default()).unwrap();
        assert!(decision.remedy.is_exhausted());
    }

    #[test]
    fn test_unknown_changes_node_once() {
        let job = job("orca", JobKind::Sp, "DLPNO ccsd(T)");
        let decision = decide(&job, &evidence(&["Unknown"]), &TrshLimits::default()).unwrap();
        assert_eq!(decision.remedy.category(), Some(RemedyCategory::ChangeNode));

        let job = with_history(job, &decision.history.to_vec());
        let decision = decide(&job, &evidence(&["Unknown"]), &TrshLimits::default()).unwrap();
        assert!(decision.remedy.is_exhausted());
    }

    #[test]
    fn test_decide_never_repeats_a_category() {
        let limits = TrshLimits::default().with_max_job_memory_mb(400_000);
        let evidence = ErrorEvidence::new(
            [
                ErrorKeyword::Unknown,
                ErrorKeyword::CheckFile,
                ErrorKeyword::InternalCoordinateError,
                ErrorKeyword::Memory,
                ErrorKeyword::MaxOptCycles,
                ErrorKeyword::Scf,
            ],
            ORCA_MEMORY,
            "",
        );
        let mut job = job("gaussian", JobKind::Opt, "b3lyp/6-31g");
        let mut taken = TroubleshootingHistory::default();
        for _ in 0..32 {
            let decision = decide(&job, &evidence, &limits).unwrap();
            let Some(category) = decision.remedy.category() else {
                break;
            };
            assert!(taken.insert(category), "{category} was applied twice");
            apply(&mut job, &decision.remedy);
        }
        assert!(decide(&job, &evidence, &limits).unwrap().remedy.is_exhausted());
    }

    #[test]
    fn test_troubleshoot_server() {
        let job = job("gaussian", JobKind::Opt, "b3lyp/6-31g");
        let decision = troubleshoot_server(&job, &JobStatus::ErroredOnNode("18".to_string()));
        assert_eq!(
            decision.remedy,
            Remedy::Resubmit {
                category: RemedyCategory::ChangeNode,
                discard_checkpoint: false,
                exclude_node: Some("18".to_string()),
            }
        );

        let job = with_history(job, &decision.history.to_vec());
        assert!(troubleshoot_server(&job, &JobStatus::Errored).remedy.is_exhausted());
    }

    #[test]
    fn test_troubleshoot_missing_output_once() {
        let mut job = job("gaussian", JobKind::Opt, "b3lyp/6-31g");
        let decision = troubleshoot_missing_output(&job);
        assert_eq!(decision.remedy.category(), Some(RemedyCategory::OutputMissing));
        apply(&mut job, &decision.remedy);
        assert!(troubleshoot_missing_output(&job).remedy.is_exhausted());
    }

    #[test]
    fn test_limits_for_target() {
        let mut target = Target::local(remedy_core::SchedulerKind::Slurm, "alice");
        target.max_job_memory_mb = Some(250_000);
        let limits = TrshLimits::for_target(&target);
        assert_eq!(limits.max_job_memory_mb, Some(250_000));
        assert_eq!(limits.max_cpus, None);
        assert_eq!(limits.memory_margin, 1.02);
    }

    #[test]
    fn test_cpu_limit_respects_target_max() {
        let mut job = job("orca", JobKind::Sp, "DLPNO ccsd(T)");
        job.resources.cpus = 16;
        let evidence = ErrorEvidence::new(
            [ErrorKeyword::Cpu],
            "The maximum number of cpu cores can be used for this job is 10.",
            "",
        );
        let limits = TrshLimits {
            max_cpus: Some(6),
            ..TrshLimits::default()
        };
        let decision = decide(&job, &evidence, &limits).unwrap();
        assert!(matches!(decision.remedy, Remedy::Resources { cpus: 6, .. }));
    }
}
