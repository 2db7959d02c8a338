//! Slurm conventions.
//!
//! Queue line format (default squeue columns):
//! `14428     debug a1371   user_name  R 50-04:04:46      1 node06`
//!
//! Submission acknowledgement:
//! `Submitted batch job 14428`

use crate::commands::CommandSet;
use remedy_parsers::{last_token, tail_chars};

/// squeue prints one column header.
pub const HEADER_LINES: usize = 1;

pub const ACK_ID_INDEX: usize = 3;

/// Pending, configuring and completing jobs are still owned by Slurm.
pub const EXTRA_ACTIVE_STATES: [&str; 3] = ["pd", "cf", "cg"];

pub fn default_commands() -> CommandSet {
    CommandSet {
        submit: "/usr/bin/sbatch".to_string(),
        status: "/usr/bin/squeue".to_string(),
        delete: "/usr/bin/scancel".to_string(),
        submit_filename: "submit.sl".to_string(),
    }
}

/// Node suffix from the NODELIST column (last token).
///
/// Pending jobs show a parenthesised reason instead of a node.
pub fn node_suffix(status_line: &str) -> Option<String> {
    let node = last_token(status_line)?;
    if node.starts_with('(') {
        return None;
    }
    Some(tail_chars(node, 2).to_string())
}
