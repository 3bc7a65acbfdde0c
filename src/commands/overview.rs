//! Overview command implementation.
//!
//! For every full trace, independently:
//! 1. Finds the ingestion and storage threads by their marker events
//! 2. Extracts each ingestion thread into `analysis/ingestion/` and
//!    computes its time breakdown
//! 3. Does the same for storage threads into `analysis/storage/`
//! 4. Writes the per-thread breakdowns into one overview report

use super::breakdown::breakdown_file;
use super::models::{ExtractArgs, OverviewArgs, ThreadsArgs};
use super::threads::{execute_extract, execute_find_threads};
use super::utils::validate_input_file;
use crate::aggregator::ThreadBreakdown;
use crate::output::{render_overview, report_path, write_report};
use crate::parser::ThreadKey;
use crate::utils::config::{
    ANALYSIS_DIR, INGESTION_DIR, INGESTION_THREAD_NAME, OVERVIEW_SUFFIX, STORAGE_DIR,
    STORAGE_THREAD_NAME,
};
use anyhow::{Context, Result};
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of the overview of one trace
#[derive(Debug, Clone)]
pub struct Overview {
    pub input: PathBuf,
    pub ingestion: Vec<ThreadBreakdown>,
    pub storage: Vec<ThreadBreakdown>,
    pub report: String,
    pub report_path: PathBuf,
}

/// Outcome of a multi-file overview run
#[derive(Debug, Default)]
pub struct OverviewSummary {
    pub completed: Vec<Overview>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl OverviewSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Execute the overview command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// Only for invalid arguments; per-file failures are collected in the
/// returned summary
pub fn execute_overview(args: &OverviewArgs) -> Result<OverviewSummary> {
    if args.inputs.is_empty() {
        anyhow::bail!("At least one input file is required");
    }
    let start_time = Instant::now();

    let mut summary = OverviewSummary::default();
    for input in &args.inputs {
        match overview_file(input) {
            Ok(overview) => {
                if args.print_report {
                    println!("{}", overview.report);
                }
                summary.completed.push(overview);
            }
            Err(e) => {
                error!("Overview of {} failed: {:#}", input.display(), e);
                summary.failed.push((input.clone(), e));
            }
        }
    }

    info!(
        "Overviewed {} file(s), {} failed, in {:.2}s",
        summary.completed.len(),
        summary.failed.len(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(summary)
}

/// Run the thread overview over one full trace
///
/// **Public** - single-file entry point
pub fn overview_file(input: &Path) -> Result<Overview> {
    validate_input_file(input)?;
    info!("Overview of {}", input.display());

    info!("Step 1/4: Finding ingestion and storage threads...");
    let ingestion_threads = find_role(input, INGESTION_THREAD_NAME)?;
    let storage_threads = find_role(input, STORAGE_THREAD_NAME)?;

    info!(
        "Step 2/4: Breaking down {} ingestion thread(s)...",
        ingestion_threads.len()
    );
    let ingestion = break_down_threads(input, &ingestion_threads, INGESTION_DIR)?;

    info!(
        "Step 3/4: Breaking down {} storage thread(s)...",
        storage_threads.len()
    );
    let storage = break_down_threads(input, &storage_threads, STORAGE_DIR)?;

    info!("Step 4/4: Writing overview...");
    let report = render_overview(&input.display().to_string(), &ingestion, &storage);
    let output_path = report_path(input, OVERVIEW_SUFFIX);
    write_report(&report, &output_path).context("Failed to write overview")?;

    Ok(Overview {
        input: input.to_path_buf(),
        ingestion,
        storage,
        report,
        report_path: output_path,
    })
}

/// Threads that emitted an event named `marker`
fn find_role(input: &Path, marker: &str) -> Result<Vec<ThreadKey>> {
    execute_find_threads(&ThreadsArgs {
        input: input.to_path_buf(),
        values: vec![marker.to_string()],
        ..Default::default()
    })
}

/// Extract each thread on its own under `analysis/<subdir>/` and break it down
fn break_down_threads(
    input: &Path,
    threads: &[ThreadKey],
    subdir: &str,
) -> Result<Vec<ThreadBreakdown>> {
    let out_dir = Path::new(ANALYSIS_DIR)
        .join(subdir)
        .to_string_lossy()
        .into_owned();

    threads
        .iter()
        .map(|thread| -> Result<ThreadBreakdown> {
            let (source, stats) = execute_extract(&ExtractArgs {
                input: input.to_path_buf(),
                threads: vec![thread.clone()],
                out_dir: out_dir.clone(),
            })?;
            debug!("Thread {}: {} event(s) extracted", thread, stats.total_out());

            let breakdown = breakdown_file(&source)?;
            Ok(ThreadBreakdown {
                thread: thread.clone(),
                source,
                breakdown,
            })
        })
        .collect()
}
