//! Breakdown command implementation.

use super::models::BreakdownArgs;
use super::utils::{open_input, validate_input_file};
use crate::aggregator::{compute_breakdown, TimeBreakdown};
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Execute the breakdown command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Missing or unreadable input
pub fn execute_breakdown(args: &BreakdownArgs) -> Result<TimeBreakdown> {
    validate_input_file(&args.input)?;

    info!("Computing time breakdown of {}...", args.input.display());
    let breakdown = breakdown_file(&args.input)?;
    info!("{}", breakdown.summary());

    Ok(breakdown)
}

/// Time breakdown of a single-thread event file
///
/// **Public** - shared with the overview command
pub fn breakdown_file(path: &Path) -> Result<TimeBreakdown> {
    let reader = open_input(path)?;
    compute_breakdown(reader)
        .with_context(|| format!("Failed to compute time breakdown for {}", path.display()))
}
