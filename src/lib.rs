//! LSM Lineage
//!
//! Compaction lineage and tree height analysis for the trace logs of an
//! LSM storage engine.
//!
//! Flush and merge operations are traced as begin/end event pairs. This
//! crate pairs them up, numbers the flushed components, resolves every
//! merge to the range of flushes it covers, and rebuilds the resulting
//! forest to answer how many merges a record goes through before it
//! settles: in the worst case (max height) and on average (weighted
//! height).
//!
//! For full traces it can also find the ingestion and storage threads,
//! extract them and report where each thread's time went.
//!
//! ## Getting Started
//!
//! ```bash
//! lsm-lineage analyze logs/index-storage-thread.json
//! lsm-lineage overview logs/trace.json
//! lsm-lineage --help
//! ```

pub mod aggregator;
pub mod commands;
pub mod lineage;
pub mod output;
pub mod parser;
pub mod utils;
