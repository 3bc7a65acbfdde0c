//! Aggregation of completed operations into the compaction forest.
//!
//! This module transforms the lineage op stream into:
//! - An interval forest over flush ids
//! - Max and weighted-average height metrics
//!
//! It also holds the per-thread time breakdown, which aggregates raw events
//! instead of completed operations.

pub mod breakdown;
pub mod forest;
pub mod metrics;

// Re-export main types and functions
pub use breakdown::{compute_breakdown, DurationStats, ThreadBreakdown, TimeBreakdown};
pub use forest::{ForestNode, ForestState};
pub use metrics::{compute_heights, finalize, HeightReport, RangeHeight};
