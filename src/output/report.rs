//! Plain text reports: per-index lineage analysis and per-thread time
//! breakdowns.

use super::path::create_output;
use crate::aggregator::breakdown::{ThreadBreakdown, TimeBreakdown};
use crate::aggregator::metrics::{HeightReport, RangeHeight};
use crate::lineage::schema::LineageStats;
use crate::utils::error::OutputError;
use chrono::{DateTime, Utc};
use log::info;
use std::io::Write;
use std::path::Path;

/// Render the report for one analyzed file
///
/// **Public** - report assembly
///
/// The output only depends on its arguments, so re-running an analysis
/// over an unchanged input yields an identical report.
pub fn render_report(source: &str, stats: &LineageStats, heights: &HeightReport) -> String {
    let rule = "=".repeat(72);
    let mut out = String::new();

    out.push_str(&format!("Compaction lineage report: {}\n", source));
    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!("Events   {}\n", stats.summary()));
    out.push_str(&format!("Forest   {}\n\n", heights.summary()));

    out.push_str("Merges (range -> max height | weighted height)\n");
    write_ranges(&mut out, &heights.absorptions);
    out.push('\n');

    out.push_str("Live roots (range -> max height | weighted height)\n");
    write_ranges(&mut out, &heights.roots);
    out.push('\n');

    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!(
        "Max height (max of inputs + 1):              {}\n",
        heights.max_height
    ));
    out.push_str(&format!(
        "Weighted height (weighted mean of inputs + 1): {:.4}\n",
        heights.weighted_height
    ));
    out
}

fn write_ranges(out: &mut String, ranges: &[RangeHeight]) {
    if ranges.is_empty() {
        out.push_str("  (none)\n");
    }
    for range in ranges {
        out.push_str(&format!(
            "  [{}-{}] -> {} | {:.4}\n",
            range.start, range.end, range.max_height, range.weighted_height
        ));
    }
}

/// Render the time breakdown of one thread
///
/// **Public** - breakdown assembly
///
/// Names are listed in order; shares are fractions of the covered wall time.
pub fn render_breakdown(breakdown: &TimeBreakdown) -> String {
    let mut out = String::new();

    let (Some(start), Some(end)) = (breakdown.start_micros, breakdown.end_micros) else {
        out.push_str("No timed events\n");
        return out;
    };

    let total = breakdown.total_micros();
    out.push_str(&format!("Start = ({}): {}\n", start, format_micros(start)));
    out.push_str(&format!("End = ({}): {}\n", end, format_micros(end)));
    out.push_str(&format!(
        "Total time spent: {}us = {}ms = {}s\n",
        total,
        total / 1_000,
        total / 1_000_000
    ));

    for (name, stats) in &breakdown.durations {
        out.push_str(&format!(
            "{} took: {}us which is {:.4} of the whole time... min = {}, max = {}, count = {}\n",
            name,
            stats.total_micros,
            breakdown.share(stats.total_micros),
            stats.min_micros,
            stats.max_micros,
            stats.count
        ));
    }
    for (name, micros) in &breakdown.instant_micros {
        out.push_str(&format!(
            "{} took: {}us which is {:.4} of the whole time\n",
            name,
            micros,
            breakdown.share(*micros)
        ));
    }

    if breakdown.unmatched_ends > 0 || breakdown.unclosed_begins > 0 {
        out.push_str(&format!(
            "Unmatched end events: {}, unclosed begin events: {}\n",
            breakdown.unmatched_ends, breakdown.unclosed_begins
        ));
    }
    out
}

/// Render the thread overview of one full trace
///
/// **Public** - overview assembly
pub fn render_overview(
    source: &str,
    ingestion: &[ThreadBreakdown],
    storage: &[ThreadBreakdown],
) -> String {
    let rule = "=".repeat(72);
    let mut out = String::new();

    out.push_str(&format!("Analysis report: {}\n", source));
    out.push_str(&format!("Ingestion threads found: {}\n", thread_list(ingestion)));
    out.push_str(&format!("Storage threads found: {}\n", thread_list(storage)));

    for (label, threads) in [("ingestion", ingestion), ("storage", storage)] {
        out.push_str(&format!("\n{}\n", rule));
        out.push_str(&format!("Breakdown of {} threads:\n", label));
        for thread in threads {
            out.push_str(&format!(
                "\nProcess: {} Thread: {}\n",
                thread.thread.pid.as_deref().unwrap_or("-"),
                thread.thread.tid
            ));
            out.push_str(&render_breakdown(&thread.breakdown));
        }
    }
    out
}

fn thread_list(threads: &[ThreadBreakdown]) -> String {
    let keys: Vec<String> = threads.iter().map(|t| t.thread.to_string()).collect();
    format!("[{}]", keys.join(", "))
}

fn format_micros(micros: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.6f UTC").to_string())
        .unwrap_or_else(|| "out of range".to_string())
}

/// Write a rendered report to disk
///
/// **Public** - report file writer
pub fn write_report(report: &str, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    let mut writer = create_output(output_path)?;
    writer.write_all(report.as_bytes())?;
    writer.flush()?;

    info!("Report written to: {}", output_path.display());
    Ok(())
}
