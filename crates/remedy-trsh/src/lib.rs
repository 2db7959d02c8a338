//! Troubleshooting decision engine.
//!
//! Turns structured failure evidence into a single corrective action and
//! keeps each job from seeing the same class of remedy twice.

pub mod directives;
pub mod error;
pub mod evidence;
pub mod policy;
pub mod remedy;

pub use error::TrshError;
pub use evidence::{Classification, ErrorEvidence, ErrorKeyword};
pub use policy::{
    COMPOSITE_FALLBACK_LEVEL, TrshLimits, decide, troubleshoot_missing_output, troubleshoot_server,
};
pub use remedy::{Decision, Remedy, apply};
