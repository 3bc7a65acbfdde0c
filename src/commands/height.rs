//! Height command implementation.

use super::models::HeightArgs;
use super::utils::validate_input_file;
use crate::aggregator::{compute_heights, HeightReport};
use crate::lineage::OpId;
use crate::output::{read_height_input, read_lineage};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;

/// Execute the height command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Missing or unreadable input
/// * Malformed op stream
/// * Inconsistent merge ranges
pub fn execute_height(args: &HeightArgs) -> Result<HeightReport> {
    validate_input_file(&args.input)?;

    info!("Step 1/2: Reading op stream from {}...", args.input.display());
    let ids = read_op_stream(&args.input)?;

    info!("Step 2/2: Computing forest heights over {} ops...", ids.len());
    let report = compute_heights(&ids)
        .with_context(|| format!("Failed to compute heights for {}", args.input.display()))?;
    info!("{}", report.summary());

    Ok(report)
}

/// Read op identities from a height input or a lineage file
///
/// **Public** - the format is detected from the first non-blank character
pub fn read_op_stream(path: &Path) -> Result<Vec<OpId>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if content.trim_start().starts_with('[') {
        debug!("{} looks like a lineage file", path.display());
        read_lineage(content.as_bytes()).context("Failed to read lineage records")
    } else {
        read_height_input(content.as_bytes()).context("Failed to read height input")
    }
}
