//! LSM Lineage CLI
//!
//! Rebuilds the flush/merge lineage of an LSM index from its trace log
//! and reports how deep records travel through compaction.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use lsm_lineage::commands::{
    display_version, execute_analyze, execute_breakdown, execute_extract, execute_find_threads,
    execute_height, execute_lineage, execute_overview, AnalyzeArgs, BreakdownArgs, ExtractArgs,
    HeightArgs, LineageArgs, OverviewArgs, ThreadsArgs,
};
use lsm_lineage::output::render_breakdown;
use lsm_lineage::lineage::MissingSizePolicy;
use lsm_lineage::parser::ThreadKey;
use lsm_lineage::utils::config::{ANALYSIS_DIR, DEFAULT_THREAD_MATCH_FIELD};

/// LSM Lineage - compaction lineage and tree height analysis
#[derive(Parser, Debug)]
#[command(name = "lsm-lineage")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Pair flush/merge events and write the lineage of one index
    Lineage {
        /// Events of a single index's maintenance thread
        file: PathBuf,

        /// Keep operations that have no size instead of dropping them
        #[arg(long)]
        keep_unsized: bool,
    },

    /// Compute forest heights from an op stream or lineage file
    Height {
        /// `.ops.txt` height input or `.lineage.txt` lineage array
        file: PathBuf,
    },

    /// Run lineage, heights and report for each file
    Analyze {
        /// Files to analyze, each independently
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Keep operations that have no size instead of dropping them
        #[arg(long)]
        keep_unsized: bool,

        /// Print each report to stdout
        #[arg(long)]
        print: bool,
    },

    /// Find threads that emitted matching events
    Threads {
        /// Full trace log
        file: PathBuf,

        /// Value to match exactly (repeatable)
        #[arg(short = 'n', long = "name", required = true)]
        values: Vec<String>,

        /// Event field to match against
        #[arg(long, default_value = DEFAULT_THREAD_MATCH_FIELD)]
        field: String,
    },

    /// Extract the events of selected threads into a separate file
    Extract {
        /// Full trace log
        file: PathBuf,

        /// Thread to keep, as [<pid>:]<tid> (repeatable)
        #[arg(short = 't', long = "thread", required = true)]
        threads: Vec<ThreadKey>,

        /// Output folder, relative to the input's directory
        #[arg(long, default_value = ANALYSIS_DIR)]
        out_dir: String,
    },

    /// Per-name time breakdown of a single thread's events
    Breakdown {
        /// Events of a single thread
        file: PathBuf,
    },

    /// Find ingestion and storage threads, extract and break each one down
    Overview {
        /// Full traces, each handled independently
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print each overview to stdout
        #[arg(long)]
        print: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Lineage { file, keep_unsized } => {
            let outcome = execute_lineage(&LineageArgs {
                input: file,
                missing_size: size_policy(keep_unsized),
            })?;

            println!("✓ {}", outcome.lineage.stats.summary());
            println!("  Lineage: {}", outcome.lineage_path.display());
            println!("  Op stream: {}", outcome.ops_path.display());
        }

        Commands::Height { file } => {
            let report = execute_height(&HeightArgs { input: file })?;

            for merge in &report.absorptions {
                println!(
                    "[{}-{}] -> {} | {:.4}",
                    merge.start, merge.end, merge.max_height, merge.weighted_height
                );
            }
            println!("The max height = {}", report.max_height);
            println!("The weighted height = {:.4}", report.weighted_height);
        }

        Commands::Analyze {
            files,
            keep_unsized,
            print,
        } => {
            let summary = execute_analyze(&AnalyzeArgs {
                inputs: files,
                missing_size: size_policy(keep_unsized),
                print_report: print,
            })?;

            for analysis in &summary.completed {
                println!(
                    "✓ {} -> max {} | weighted {:.4} ({})",
                    analysis.input.display(),
                    analysis.heights.max_height,
                    analysis.heights.weighted_height,
                    analysis.report_path.display()
                );
            }
            for (input, err) in &summary.failed {
                println!("✗ {}: {:#}", input.display(), err);
            }
            if !summary.all_succeeded() {
                anyhow::bail!("{} file(s) failed analysis", summary.failed.len());
            }
        }

        Commands::Threads {
            file,
            values,
            field,
        } => {
            let threads = execute_find_threads(&ThreadsArgs {
                input: file,
                field,
                values,
            })?;

            for thread in threads {
                println!("{}", thread);
            }
        }

        Commands::Extract {
            file,
            threads,
            out_dir,
        } => {
            let args = ExtractArgs {
                input: file,
                threads,
                out_dir,
            };
            let (path, stats) = execute_extract(&args)?;

            println!(
                "✓ Extracted {} of {} lines to {}",
                stats.total_out(),
                stats.total_in,
                path.display()
            );
            for (thread, count) in args.threads.iter().zip(&stats.per_thread) {
                println!("  Thread {}: {}", thread, count);
            }
        }

        Commands::Breakdown { file } => {
            let breakdown = execute_breakdown(&BreakdownArgs { input: file })?;
            print!("{}", render_breakdown(&breakdown));
        }

        Commands::Overview { files, print } => {
            let summary = execute_overview(&OverviewArgs {
                inputs: files,
                print_report: print,
            })?;

            for overview in &summary.completed {
                println!(
                    "✓ {} -> {} ingestion / {} storage thread(s) ({})",
                    overview.input.display(),
                    overview.ingestion.len(),
                    overview.storage.len(),
                    overview.report_path.display()
                );
            }
            for (input, err) in &summary.failed {
                println!("✗ {}: {:#}", input.display(), err);
            }
            if !summary.all_succeeded() {
                anyhow::bail!("{} file(s) failed overview", summary.failed.len());
            }
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

fn size_policy(keep_unsized: bool) -> MissingSizePolicy {
    if keep_unsized {
        MissingSizePolicy::Keep
    } else {
        MissingSizePolicy::Drop
    }
}
