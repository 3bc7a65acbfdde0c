//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod analyze;
pub mod breakdown;
pub mod height;
pub mod lineage;
pub mod models;
pub mod overview;
pub mod threads;
pub mod utils;

// Re-export main command functions
pub use analyze::{analyze_file, execute_analyze, AnalyzeSummary, FileAnalysis};
pub use breakdown::{breakdown_file, execute_breakdown};
pub use height::{execute_height, read_op_stream};
pub use lineage::{execute_lineage, LineageOutcome};
pub use models::{
    AnalyzeArgs, BreakdownArgs, ExtractArgs, HeightArgs, LineageArgs, OverviewArgs, ThreadsArgs,
};
pub use overview::{execute_overview, overview_file, Overview, OverviewSummary};
pub use threads::{execute_extract, execute_find_threads};
pub use utils::display_version;
