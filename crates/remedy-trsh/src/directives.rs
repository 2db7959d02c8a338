//! Input directives per software, keyed by remedy.

use remedy_core::ScfStrategy;

pub const GAUSSIAN: &str = "gaussian";
pub const QCHEM: &str = "qchem";

pub fn cartesian_coordinates(software: &str) -> Option<&'static str> {
    match software {
        GAUSSIAN => Some("opt=(cartesian,nosymm)"),
        _ => None,
    }
}

pub fn max_cycles(software: &str) -> Option<&'static str> {
    match software {
        GAUSSIAN => Some("opt=(maxcycle=200)"),
        QCHEM => Some("GEOM_OPT_MAX_CYCLES 250"),
        _ => None,
    }
}

pub fn integral_accuracy(software: &str) -> Option<&'static str> {
    match software {
        GAUSSIAN => Some("int=(Acc2E=14)"),
        _ => None,
    }
}

/// SCF strategies in the order they are tried.
pub fn scf_ladder(software: &str) -> &'static [(ScfStrategy, &'static str)] {
    match software {
        GAUSSIAN => &[
            (ScfStrategy::QuadraticConvergence, "scf=(qc,nosymm)"),
            (ScfStrategy::Damping, "scf=(NDamp=30)"),
            (ScfStrategy::NoDiis, "scf=(NoDIIS)"),
        ],
        QCHEM => &[(ScfStrategy::DiisGdm, "SCF_ALGORITHM DIIS_GDM")],
        _ => &[],
    }
}

/// Whether a directive belongs to any SCF ladder.
pub fn is_scf_directive(directive: &str) -> bool {
    [GAUSSIAN, QCHEM]
        .iter()
        .flat_map(|software| scf_ladder(software).iter())
        .any(|(_, d)| *d == directive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables() {
        assert_eq!(cartesian_coordinates("gaussian"), Some("opt=(cartesian,nosymm)"));
        assert_eq!(cartesian_coordinates("orca"), None);
        assert_eq!(max_cycles("qchem"), Some("GEOM_OPT_MAX_CYCLES 250"));
        assert_eq!(scf_ladder("gaussian").len(), 3);
        assert!(scf_ladder("molpro").is_empty());
        assert!(is_scf_directive("scf=(NDamp=30)"));
        assert!(!is_scf_directive("int=(Acc2E=14)"));
    }
}
