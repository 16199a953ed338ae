//! Error types for qtrial
//!
//! Every failure carries enough context to tell the caller what to fix:
//! configuration, record format, history range or trial numbering.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// qtrial error types
#[derive(Error, Debug)]
pub enum Error {
    /// Monitoring or sampling configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Relative error is undefined against a zero reference value
    #[error("Reference value is exactly zero\nRelative error |mean - ref| / |ref| is undefined; supply a non-zero reference")]
    ZeroReference,

    /// Full-state enumeration requested for a space larger than the configured limit
    #[error("State space of {states} basis states exceeds the enumeration limit of {limit}\nRaise max_enumerable_states or drop the reference metric for this system size")]
    IntractableStateSpace {
        /// Number of basis states the model exposes
        states: u128,
        /// Configured enumeration limit
        limit: u128,
    },

    /// History was queried before any evaluation was recorded
    #[error("No history recorded yet")]
    NoHistory,

    /// History index outside the recorded range
    #[error("History index {index} out of range for {len} recorded entries")]
    IndexOutOfRange {
        /// Requested index (negative counts from the end)
        index: isize,
        /// Number of recorded entries
        len: usize,
    },

    /// History append with an iteration that does not follow the last entry
    #[error("Iteration {iteration} does not follow last recorded iteration {last}")]
    NonIncreasingIteration {
        /// Iteration being appended
        iteration: u64,
        /// Last recorded iteration
        last: u64,
    },

    /// Observable or metric name not tracked by the evaluator
    #[error("Unknown observable: {0}")]
    UnknownObservable(String),

    /// Automatic trial numbering with nothing to count from
    #[error("No prior trial found in {}\nSeed the first trial with an explicit trial number", .dir.display())]
    NoPriorTrial {
        /// Directory that was scanned
        dir: PathBuf,
    },

    /// Trial record has fewer rows than the analysis needs
    #[error("Trial {trial} has {rows} rows, analysis needs at least {required}")]
    TruncatedTrial {
        /// Trial number
        trial: u32,
        /// Rows present in the record
        rows: usize,
        /// Rows required (target index + 1)
        required: usize,
    },

    /// Trial record line that does not match the record schema
    #[error("Malformed trial record at line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number (0 when the problem is file-wide)
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Evaluator histories handed to the recorder disagree in length
    #[error("Misaligned histories: {observable} observable rows, {metric} metric rows, {runtime} runtime rows")]
    MisalignedHistories {
        /// Rows from the periodic evaluator
        observable: usize,
        /// Rows from the reference metric evaluator
        metric: usize,
        /// Rows from the time budget guard
        runtime: usize,
    },

    /// NaN or infinite value where a measured quantity was expected
    #[error("Non-finite {what}: {value}\nThe sampler or metric produced an undefined value; nothing was recorded")]
    NonFiniteValue {
        /// Which quantity, and where
        what: String,
        /// Offending value
        value: f64,
    },

    /// External sampling procedure failed
    #[error("Sampling failed: {0}")]
    Sampling(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (configuration or ledger) error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}
