//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while decoding trace event lines
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line {line}: event is missing required field '{field}'")]
    MissingField { line: usize, field: &'static str },

    #[error("component name '{name}' has no valid time range: {reason}")]
    InvalidTimeRange { name: String, reason: String },

    #[error("invalid thread '{0}', expected [<pid>:]<tid>")]
    InvalidThread(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that abort lineage computation for a file
#[derive(Error, Debug)]
pub enum LineageError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("line {line}: {category} end event has no matching begin")]
    UnmatchedEndEvent { line: usize, category: &'static str },

    #[error("line {line}: begin/end event has category '{category}', expected flush or merge")]
    UnexpectedCategory { line: usize, category: String },

    #[error("line {line}: duration from {begin} to {end} does not fit in i64 microseconds")]
    InvalidDuration { line: usize, begin: i64, end: i64 },

    #[error("line {line}: merge refers to component time {timestamp} that no flush produced")]
    UnresolvedTimeReference { line: usize, timestamp: i64 },

    #[error("{open} {category} operation(s) never ended (first begin at line {first_line})")]
    UnterminatedOperation {
        category: &'static str,
        open: usize,
        first_line: usize,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised while rebuilding the compaction forest
#[derive(Error, Debug)]
pub enum ForestError {
    #[error("merge {begin}-{end} does not cover a contiguous run of live ranges: {reason}")]
    NonContiguousMergeRange { begin: u64, end: u64, reason: String },

    #[error("invalid range {begin}-{end}")]
    InvalidRange { begin: u64, end: u64 },

    #[error("flush {0} is already live")]
    DuplicateLeaf(u64),

    #[error("line {line}: '{content}' is neither a flush nor a merge")]
    MalformedHeightLine { line: usize, content: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Invalid lineage record: {0}")]
    InvalidRecord(String),
}
