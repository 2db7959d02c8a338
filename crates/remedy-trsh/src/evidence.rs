//! Failure evidence as reported by a log classifier.

use once_cell::sync::Lazy;
use regex::Regex;
use remedy_parsers::parse_memory_mb;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

static PER_CORE_MEMORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)per cpu core memory to\s+(\d+(?:\.\d+)?\s*[KMGT]?B)").expect("valid memory regex"));

static MAX_CPUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)can be used for this job is\s+(\d+)").expect("valid cpu regex"));

/// Error taxonomy tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKeyword {
    CheckFile,
    InternalCoordinateError,
    Unconverged,
    MaxOptCycles,
    Scf,
    Memory,
    /// The job already asked for the most memory the target allows
    MaxTotalJobMemory,
    Cpu,
    BasisSet,
    Syntax,
    Multiplicity,
    Unknown,
    Other(String),
}

impl From<&str> for ErrorKeyword {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "checkfile" => Self::CheckFile,
            "internalcoordinateerror" => Self::InternalCoordinateError,
            "unconverged" => Self::Unconverged,
            "maxoptcycles" => Self::MaxOptCycles,
            "scf" => Self::Scf,
            "memory" => Self::Memory,
            "max_total_job_memory" | "maxtotaljobmemory" => Self::MaxTotalJobMemory,
            "cpu" => Self::Cpu,
            "basisset" => Self::BasisSet,
            "syntax" => Self::Syntax,
            "multiplicity" => Self::Multiplicity,
            "unknown" => Self::Unknown,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl FromStr for ErrorKeyword {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for ErrorKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckFile => write!(f, "CheckFile"),
            Self::InternalCoordinateError => write!(f, "InternalCoordinateError"),
            Self::Unconverged => write!(f, "Unconverged"),
            Self::MaxOptCycles => write!(f, "MaxOptCycles"),
            Self::Scf => write!(f, "SCF"),
            Self::Memory => write!(f, "Memory"),
            Self::MaxTotalJobMemory => write!(f, "max_total_job_memory"),
            Self::Cpu => write!(f, "Cpu"),
            Self::BasisSet => write!(f, "BasisSet"),
            Self::Syntax => write!(f, "Syntax"),
            Self::Multiplicity => write!(f, "Multiplicity"),
            Self::Unknown => write!(f, "Unknown"),
            Self::Other(tag) => write!(f, "{}", tag),
        }
    }
}

/// What went wrong in a failed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvidence {
    /// Taxonomy tags in the order the classifier found them, without duplicates
    pub keywords: Vec<ErrorKeyword>,
    pub message: String,
    /// The offending output line
    pub line: String,
}

impl ErrorEvidence {
    pub fn new(
        keywords: impl IntoIterator<Item = ErrorKeyword>,
        message: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        let mut evidence = Self {
            keywords: Vec::new(),
            message: message.into(),
            line: line.into(),
        };
        for keyword in keywords {
            evidence.add_keyword(keyword);
        }
        evidence
    }

    /// Evidence from raw keyword strings.
    pub fn from_tags<'a>(
        tags: impl IntoIterator<Item = &'a str>,
        message: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        Self::new(tags.into_iter().map(ErrorKeyword::from), message, line)
    }

    pub fn add_keyword(&mut self, keyword: ErrorKeyword) {
        if !self.keywords.contains(&keyword) {
            self.keywords.push(keyword);
        }
    }

    pub fn has(&self, keyword: &ErrorKeyword) -> bool {
        self.keywords.contains(keyword)
    }

    /// Per-core memory the program asked for, in MB.
    pub fn per_core_memory_mb(&self) -> Option<u64> {
        [&self.message, &self.line].into_iter().find_map(|text| {
            PER_CORE_MEMORY_RE
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| parse_memory_mb(m.as_str()))
        })
    }

    /// Largest cpu count the program can use for this job.
    pub fn max_usable_cpus(&self) -> Option<u32> {
        capture_number(&MAX_CPUS_RE, &self.message)
            .or_else(|| capture_number(&MAX_CPUS_RE, &self.line))
    }
}

fn capture_number<T: FromStr>(re: &Regex, text: &str) -> Option<T> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Result of classifying a program's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Done,
    Errored(ErrorEvidence),
}
