use crate::lineage::MissingSizePolicy;
use crate::parser::ThreadKey;
use crate::utils::config::{ANALYSIS_DIR, DEFAULT_THREAD_MATCH_FIELD};
use std::path::PathBuf;

/// Arguments for the lineage command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct LineageArgs {
    /// Events of a single index's maintenance thread
    pub input: PathBuf,

    /// Handling of operations without a size
    pub missing_size: MissingSizePolicy,
}

/// Arguments for the height command
#[derive(Debug, Clone, Default)]
pub struct HeightArgs {
    /// Height input text or lineage JSON array
    pub input: PathBuf,
}

/// Arguments for the analyze command
#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Files to analyze, each independently
    pub inputs: Vec<PathBuf>,

    pub missing_size: MissingSizePolicy,

    /// Print each report to stdout
    pub print_report: bool,
}

/// Arguments for the breakdown command
#[derive(Debug, Clone, Default)]
pub struct BreakdownArgs {
    /// Events of a single thread
    pub input: PathBuf,
}

/// Arguments for the overview command
#[derive(Debug, Clone, Default)]
pub struct OverviewArgs {
    /// Full traces, each handled independently
    pub inputs: Vec<PathBuf>,

    /// Print each overview to stdout
    pub print_report: bool,
}

/// Arguments for thread discovery
#[derive(Debug, Clone)]
pub struct ThreadsArgs {
    pub input: PathBuf,

    /// Event field compared against `values`
    pub field: String,

    /// Accepted field values, exact match
    pub values: Vec<String>,
}

impl Default for ThreadsArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            field: DEFAULT_THREAD_MATCH_FIELD.to_string(),
            values: Vec::new(),
        }
    }
}

/// Arguments for thread extraction
#[derive(Debug, Clone)]
pub struct ExtractArgs {
    pub input: PathBuf,

    /// Threads whose events are kept
    pub threads: Vec<ThreadKey>,

    /// Output folder, relative to the input's directory
    pub out_dir: String,
}

impl Default for ExtractArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            threads: Vec::new(),
            out_dir: ANALYSIS_DIR.to_string(),
        }
    }
}
