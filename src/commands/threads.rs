//! Thread discovery and extraction commands.

use super::models::{ExtractArgs, ThreadsArgs};
use super::utils::{open_input, validate_input_file};
use crate::output::filtered_path;
use crate::output::path::create_output;
use crate::parser::{extract_threads, find_threads, ExtractStats, ThreadKey};
use anyhow::{Context, Result};
use log::info;
use std::path::{Component, Path, PathBuf};

/// Execute thread discovery
///
/// **Public** - main entry point called from main.rs
pub fn execute_find_threads(args: &ThreadsArgs) -> Result<Vec<ThreadKey>> {
    validate_threads_args(args)?;

    let reader = open_input(&args.input)?;
    find_threads(reader, &args.field, &args.values)
        .with_context(|| format!("Failed to scan {} for threads", args.input.display()))
}

/// Execute thread extraction
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// Path of the extracted file and per-thread counts
pub fn execute_extract(args: &ExtractArgs) -> Result<(PathBuf, ExtractStats)> {
    validate_extract_args(args)?;

    let tags: Vec<String> = args.threads.iter().map(ThreadKey::file_tag).collect();
    let output_path = filtered_path(&args.input, &args.out_dir, &tags);
    info!("Writing extracted events to {}", output_path.display());

    let reader = open_input(&args.input)?;
    let writer = create_output(&output_path).context("Failed to create extraction output")?;
    let stats = extract_threads(reader, writer, &args.threads)
        .with_context(|| format!("Failed to extract threads from {}", args.input.display()))?;

    Ok((output_path, stats))
}

/// Validate thread discovery arguments
pub fn validate_threads_args(args: &ThreadsArgs) -> Result<()> {
    validate_input_file(&args.input)?;
    if args.field.is_empty() {
        anyhow::bail!("Match field cannot be empty");
    }
    if args.values.is_empty() {
        anyhow::bail!("At least one value to match is required");
    }
    Ok(())
}

/// Validate thread extraction arguments
pub fn validate_extract_args(args: &ExtractArgs) -> Result<()> {
    validate_input_file(&args.input)?;
    if args.threads.is_empty() {
        anyhow::bail!("At least one thread is required");
    }
    if args.out_dir.is_empty() {
        anyhow::bail!("Output folder cannot be empty");
    }
    let escapes = Path::new(&args.out_dir)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        anyhow::bail!("Output folder must be a relative path below the input directory");
    }
    Ok(())
}
