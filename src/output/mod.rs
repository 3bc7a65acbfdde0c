//! Output writers for lineage, op streams and reports.
//!
//! This module handles writing data to disk in various formats:
//! - Lineage JSON arrays
//! - Height input text
//! - Text reports and time breakdowns

pub mod lineage;
pub mod path;
pub mod report;

// Re-export main functions
pub use lineage::{
    read_height_input, read_lineage, write_height_input_file, write_lineage_file,
};
pub use path::{filtered_path, report_path, sibling_with_suffix};
pub use report::{render_breakdown, render_overview, render_report, write_report};
