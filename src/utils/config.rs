//! Configuration and constants for the CLI.

// Field names for event decoding (producers disagree on short vs long keys)
pub const NAME_FIELD_NAMES: &[&str] = &["name"];
pub const CATEGORY_FIELD_NAMES: &[&str] = &["cat", "category"];
pub const PHASE_FIELD_NAMES: &[&str] = &["ph", "phase"];
pub const TIMESTAMP_FIELD_NAMES: &[&str] = &["ts", "timestamp"];
pub const ARGS_FIELD_NAME: &str = "args";
pub const SIZE_FIELD_NAME: &str = "size";

// Thread identity fields
pub const THREAD_FIELD_NAME: &str = "tid";
pub const PROCESS_FIELD_NAME: &str = "pid";

// Category and phase labels
pub const CATEGORY_FLUSH: &str = "flush";
pub const CATEGORY_MERGE: &str = "merge";
pub const PHASE_BEGIN: &str = "B";
pub const PHASE_END: &str = "E";
pub const PHASE_INSTANT: &[&str] = &["i", "I"];

// Component names end with "<newest>_<oldest>_b", each stamp in this format
pub const DATE_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";
pub const DATE_SAMPLE: &str = "2017-10-17-23-08-06-570";
pub const DATE_LEN: usize = DATE_SAMPLE.len();
/// `<date>_<date>_b`
pub const SUFFIX_LEN: usize = DATE_LEN * 2 + 3;

// Height input line prefixes
pub const FLUSH_LINE_PREFIX: &str = "flush -> ";
pub const MERGE_LINE_PREFIX: &str = "merge -> ";

// Derived output paths
pub const LINEAGE_SUFFIX: &str = ".lineage.txt";
pub const OPS_SUFFIX: &str = ".ops.txt";
pub const REPORT_SUFFIX: &str = ".report.txt";
pub const ANALYSIS_DIR: &str = "analysis";
pub const FILTERED_INFIX: &str = ".filtered";

/// Default field matched by thread discovery
pub const DEFAULT_THREAD_MATCH_FIELD: &str = "name";

// Time breakdown of instant events: `args.count` samples of `args.avg-duration-ns`
pub const COUNT_FIELD_NAME: &str = "count";
pub const AVG_DURATION_NANOS_FIELD_NAME: &str = "avg-duration-ns";

// Thread overview: marker event names and extraction folders under ANALYSIS_DIR
pub const INGESTION_THREAD_NAME: &str = "Write-Network-Ingestion-To-Store";
pub const STORAGE_THREAD_NAME: &str = "Ingestion-Store";
pub const INGESTION_DIR: &str = "ingestion";
pub const STORAGE_DIR: &str = "storage";
pub const OVERVIEW_SUFFIX: &str = ".overview.txt";
