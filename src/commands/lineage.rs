//! Lineage command implementation.
//!
//! The lineage command:
//! 1. Correlates begin/end events into completed operations
//! 2. Writes the lineage JSON array and the height input text

use super::models::LineageArgs;
use super::utils::{open_input, validate_input_file};
use crate::lineage::{compute_lineage, Lineage, MissingSizePolicy};
use crate::output::{sibling_with_suffix, write_height_input_file, write_lineage_file};
use crate::utils::config::{LINEAGE_SUFFIX, OPS_SUFFIX};
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

/// Files produced by a lineage run
#[derive(Debug, Clone)]
pub struct LineageOutcome {
    pub lineage: Lineage,
    pub lineage_path: PathBuf,
    pub ops_path: PathBuf,
}

/// Execute the lineage command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Missing or unreadable input
/// * Any lineage error (the outputs are not written)
/// * File write errors
pub fn execute_lineage(args: &LineageArgs) -> Result<LineageOutcome> {
    validate_input_file(&args.input)?;

    info!("Step 1/2: Correlating events in {}...", args.input.display());
    let lineage = run_lineage(&args.input, args.missing_size)?;
    info!("{}", lineage.stats.summary());

    info!("Step 2/2: Writing lineage outputs...");
    let (lineage_path, ops_path) = write_lineage_outputs(&args.input, &lineage)?;

    Ok(LineageOutcome {
        lineage,
        lineage_path,
        ops_path,
    })
}

/// Correlate a whole input file
///
/// **Public** - shared with the analyze command
pub fn run_lineage(input: &Path, policy: MissingSizePolicy) -> Result<Lineage> {
    let reader = open_input(input)?;
    compute_lineage(reader, policy)
        .with_context(|| format!("Failed to compute lineage for {}", input.display()))
}

/// Write `<stem>.lineage.txt` and `<stem>.ops.txt` next to the input
///
/// **Public** - shared with the analyze command
pub fn write_lineage_outputs(input: &Path, lineage: &Lineage) -> Result<(PathBuf, PathBuf)> {
    let lineage_path = sibling_with_suffix(input, LINEAGE_SUFFIX);
    write_lineage_file(&lineage.ops, &lineage_path).context("Failed to write lineage file")?;

    let ops_path = sibling_with_suffix(input, OPS_SUFFIX);
    write_height_input_file(&lineage.ops, &ops_path).context("Failed to write op stream")?;

    Ok((lineage_path, ops_path))
}
