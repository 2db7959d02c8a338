//! Shared parsing utilities for scheduler and program output.
//!
//! Used by the channel, scheduler and troubleshooting crates so that
//! column handling and unit conversion live in one place.

pub mod command;
pub mod memory;
pub mod time;

pub use command::{CommandError, CommandOutput, run_shell};
pub use memory::parse_memory_mb;
pub use time::{format_duration, format_duration_hours, format_duration_slurm};

/// Return the whitespace-delimited field at `index`, if present.
pub fn whitespace_field(line: &str, index: usize) -> Option<&str> {
    line.split_whitespace().nth(index)
}

/// Return the last whitespace-delimited token of a line.
pub fn last_token(line: &str) -> Option<&str> {
    line.split_whitespace().next_back()
}

/// Return the last `n` characters of `s` (or all of `s` if shorter).
pub fn tail_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let skip = count - n;
    match s.char_indices().nth(skip) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// Whether `token` appears in `line` as a whole whitespace-delimited token.
pub fn contains_token(line: &str, token: &str) -> bool {
    line.split_whitespace().any(|t| t == token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_field() {
        let line = "14428     debug a1371   user  R 50-04:04:46      1 node06";
        assert_eq!(whitespace_field(line, 0), Some("14428"));
        assert_eq!(whitespace_field(line, 4), Some("R"));
        assert_eq!(whitespace_field(line, 20), None);
    }

    #[test]
    fn test_last_token_and_tail() {
        let line = "540420 0.45326 a1340 user r 10/26/2018 11:08:30 long1@node18.cluster";
        assert_eq!(last_token(line), Some("long1@node18.cluster"));
        assert_eq!(tail_chars("node06", 2), "06");
        assert_eq!(tail_chars("n", 2), "n");
        assert_eq!(last_token("   "), None);
    }

    #[test]
    fn test_contains_token() {
        assert!(contains_token("1234 debug a1", "1234"));
        assert!(!contains_token("12345 debug a1", "1234"));
    }
}
