//! Analyze command implementation.
//!
//! For every input file, independently:
//! 1. Correlates events into completed operations
//! 2. Writes the lineage JSON array and the height input text
//! 3. Rebuilds the compaction forest and computes both heights
//! 4. Writes the text report
//!
//! A failing file is reported and skipped; the remaining files are still
//! analyzed. Outputs of a failed file must not be trusted.

use super::lineage::{run_lineage, write_lineage_outputs};
use super::models::AnalyzeArgs;
use super::utils::validate_input_file;
use crate::aggregator::{compute_heights, HeightReport};
use crate::lineage::{LineageStats, MissingSizePolicy};
use crate::output::{render_report, report_path, write_report};
use crate::utils::config::REPORT_SUFFIX;
use anyhow::{Context, Result};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of analyzing one file
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub input: PathBuf,
    pub stats: LineageStats,
    pub heights: HeightReport,
    pub report: String,
    pub report_path: PathBuf,
}

/// Outcome of a multi-file run
#[derive(Debug, Default)]
pub struct AnalyzeSummary {
    pub completed: Vec<FileAnalysis>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl AnalyzeSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// Only for invalid arguments; per-file failures are collected in the
/// returned summary
pub fn execute_analyze(args: &AnalyzeArgs) -> Result<AnalyzeSummary> {
    validate_analyze_args(args)?;
    let start_time = Instant::now();

    let mut summary = AnalyzeSummary::default();
    for input in &args.inputs {
        match analyze_file(input, args.missing_size) {
            Ok(analysis) => {
                if args.print_report {
                    println!("{}", analysis.report);
                }
                summary.completed.push(analysis);
            }
            Err(e) => {
                error!("Analysis of {} failed: {:#}", input.display(), e);
                summary.failed.push((input.clone(), e));
            }
        }
    }

    info!(
        "Analyzed {} file(s), {} failed, in {:.2}s",
        summary.completed.len(),
        summary.failed.len(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(summary)
}

/// Run the full pipeline over one file
///
/// **Public** - single-file entry point
pub fn analyze_file(input: &Path, policy: MissingSizePolicy) -> Result<FileAnalysis> {
    validate_input_file(input)?;
    info!("Analyzing {}", input.display());

    info!("Step 1/4: Correlating events...");
    let lineage = run_lineage(input, policy)?;
    info!("{}", lineage.stats.summary());

    info!("Step 2/4: Writing lineage outputs...");
    write_lineage_outputs(input, &lineage)?;

    info!("Step 3/4: Computing forest heights...");
    let heights = compute_heights(lineage.ops.iter().map(|op| &op.id))
        .with_context(|| format!("Failed to compute heights for {}", input.display()))?;
    info!("{}", heights.summary());

    info!("Step 4/4: Writing report...");
    let report = render_report(&input.display().to_string(), &lineage.stats, &heights);
    let output_path = report_path(input, REPORT_SUFFIX);
    write_report(&report, &output_path).context("Failed to write report")?;

    Ok(FileAnalysis {
        input: input.to_path_buf(),
        stats: lineage.stats,
        heights,
        report,
        report_path: output_path,
    })
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_analyze_args(args: &AnalyzeArgs) -> Result<()> {
    if args.inputs.is_empty() {
        anyhow::bail!("At least one input file is required");
    }
    Ok(())
}
