//! Corrective actions and how they change a job.

use crate::directives;
use remedy_core::{Job, JobKind, RemedyCategory, TroubleshootingHistory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Remedy {
    /// Resubmit with the same parameters
    Resubmit {
        category: RemedyCategory,
        discard_checkpoint: bool,
        exclude_node: Option<String>,
    },
    /// Resubmit with a new resource request
    Resources {
        category: RemedyCategory,
        cpus: u32,
        memory_mb: u64,
    },
    /// Resubmit with an extra input directive
    Directive {
        category: RemedyCategory,
        directive: String,
    },
    /// Switch to a composite method at the given level of theory
    CompositeFallback { level: String },
    /// Nothing left to try
    Exhausted,
}

impl Remedy {
    pub fn category(&self) -> Option<RemedyCategory> {
        match self {
            Self::Resubmit { category, .. }
            | Self::Resources { category, .. }
            | Self::Directive { category, .. } => Some(*category),
            Self::CompositeFallback { .. } => Some(RemedyCategory::CompositeFallback),
            Self::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// A remedy together with the job history that results from taking it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub remedy: Remedy,
    pub history: TroubleshootingHistory,
}

impl Decision {
    /// Record `remedy` on top of `history`.
    pub(crate) fn take(remedy: Remedy, history: &TroubleshootingHistory) -> Self {
        let mut history = history.clone();
        if let Some(category) = remedy.category() {
            history.insert(category);
        }
        Self { remedy, history }
    }

    pub(crate) fn exhausted(history: &TroubleshootingHistory) -> Self {
        Self {
            remedy: Remedy::Exhausted,
            history: history.clone(),
        }
    }
}

/// Apply a remedy to a job ahead of resubmission.
pub fn apply(job: &mut Job, remedy: &Remedy) {
    match remedy {
        Remedy::Resubmit {
            discard_checkpoint,
            exclude_node,
            ..
        } => {
            if *discard_checkpoint {
                job.checkpoint = None;
            }
            if let Some(node) = exclude_node
                && !job.excluded_nodes.contains(node)
            {
                job.excluded_nodes.push(node.clone());
            }
        }
        Remedy::Resources {
            cpus, memory_mb, ..
        } => {
            job.resources.cpus = *cpus;
            job.resources.memory_mb = *memory_mb;
        }
        Remedy::Directive {
            category,
            directive,
        } => {
            // A new SCF strategy replaces the previous one
            if matches!(category, RemedyCategory::Scf(_)) {
                job.directives.retain(|d| !directives::is_scf_directive(d));
            }
            if !job.directives.contains(directive) {
                job.directives.push(directive.clone());
            }
        }
        Remedy::CompositeFallback { level } => {
            job.level_of_theory = level.clone();
            job.kind = JobKind::Composite;
            job.directives.clear();
        }
        Remedy::Exhausted => return,
    }
    if let Some(category) = remedy.category() {
        job.history.insert(category);
    }
    tracing::debug!("Applied {:?} to job {} of {}", remedy, job.name, job.label);
}
