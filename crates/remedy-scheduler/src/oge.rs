//! Oracle Grid Engine conventions.
//!
//! Queue line format:
//! `540420 0.45326 a1340    user_name       r     10/26/2018 11:08:30 long1@node18.cluster`
//!
//! Submission acknowledgement:
//! `Your job 540420 ("a1340") has been submitted`

use crate::commands::CommandSet;
use remedy_parsers::{last_token, tail_chars};

const SGE_PREFIX: &str = "export SGE_ROOT=/opt/sge; /opt/sge/bin/lx24-amd64";

/// qstat prints a column header and a dashed rule.
pub const HEADER_LINES: usize = 2;

pub const ACK_ID_INDEX: usize = 2;

pub fn default_commands() -> CommandSet {
    CommandSet {
        submit: format!("{}/qsub", SGE_PREFIX),
        status: format!("{}/qstat", SGE_PREFIX),
        delete: format!("{}/qdel", SGE_PREFIX),
        submit_filename: "submit.sh".to_string(),
    }
}

/// Node suffix from the `queue@nodeNN.cluster` column.
///
/// Only lines naming a `.cluster` host carry a node; pending jobs in an
/// error state have no queue column.
pub fn node_suffix(status_line: &str) -> Option<String> {
    if !status_line.contains(".cluster") {
        return None;
    }
    let queue = last_token(status_line)?;
    let host = queue.split('@').nth(1)?;
    let node = host.split('.').next()?;
    if node.is_empty() {
        return None;
    }
    Some(tail_chars(node, 2).to_string())
}
