//! Height metrics over the compaction forest.
//!
//! Two heights are tracked per node:
//! - max: the longest merge chain any flushed record went through
//! - weighted: the average chain length, weighted by flush count
//!
//! The first is the worst case, the second the typical case. They agree
//! on balanced trees and diverge as the tree gets lopsided.

use super::forest::{ForestNode, ForestState};
use crate::lineage::schema::OpId;
use crate::utils::error::ForestError;
use log::debug;

/// Heights computed for one range of flush ids
#[derive(Debug, Clone, PartialEq)]
pub struct RangeHeight {
    pub start: u64,
    pub end: u64,
    pub max_height: u32,
    pub weighted_height: f64,
}

impl From<&ForestNode> for RangeHeight {
    fn from(node: &ForestNode) -> Self {
        Self {
            start: node.start,
            end: node.end,
            max_height: node.max_height,
            weighted_height: node.weighted_height,
        }
    }
}

/// Final result of a height computation
#[derive(Debug, Clone, PartialEq)]
pub struct HeightReport {
    /// Global max-metric height
    pub max_height: u32,

    /// Global weighted-metric height
    pub weighted_height: f64,

    /// One entry per merge, in stream order
    pub absorptions: Vec<RangeHeight>,

    /// Nodes never absorbed, ordered by start id
    pub roots: Vec<RangeHeight>,

    pub flushes: usize,
}

impl HeightReport {
    /// Get human-readable summary
    ///
    /// **Public** - for logging and CLI output
    pub fn summary(&self) -> String {
        format!(
            "Max height: {} | Weighted height: {:.4} | Flushes: {} | Merges: {} | Roots: {}",
            self.max_height,
            self.weighted_height,
            self.flushes,
            self.absorptions.len(),
            self.roots.len()
        )
    }
}

/// Build the forest from an op stream and compute both heights
///
/// **Public** - main entry point for height computation
///
/// # Arguments
/// * `ops` - Operation identities in completion order
///
/// # Returns
/// Global heights plus the per-merge and per-root detail
///
/// # Errors
/// Any `ForestError` from an inconsistent stream
pub fn compute_heights<'a, I>(ops: I) -> Result<HeightReport, ForestError>
where
    I: IntoIterator<Item = &'a OpId>,
{
    let mut forest = ForestState::new();
    let mut absorptions = Vec::new();
    let mut flushes = 0;

    for op in ops {
        let slot = forest.apply(op)?;
        match op {
            OpId::Flush(_) => flushes += 1,
            OpId::Merge { .. } => absorptions.push(RangeHeight::from(forest.node(slot))),
        }
    }

    let report = finalize(&forest, absorptions, flushes);
    debug!("Height computation: {}", report.summary());
    Ok(report)
}

/// Reduce the live nodes of a forest to the global heights
///
/// **Public** - usable with a forest built incrementally
pub fn finalize(forest: &ForestState, absorptions: Vec<RangeHeight>, flushes: usize) -> HeightReport {
    HeightReport {
        max_height: forest.max_height(),
        weighted_height: forest.weighted_height(),
        absorptions,
        roots: forest.live_nodes().map(RangeHeight::from).collect(),
        flushes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flushes(ids: std::ops::Range<u64>) -> Vec<OpId> {
        ids.map(OpId::Flush).collect()
    }

    #[test]
    fn test_single_merge_over_five_flushes() {
        let mut ops = flushes(0..5);
        ops.push(OpId::Merge { begin: 0, end: 4 });

        let report = compute_heights(&ops).unwrap();
        assert_eq!(report.max_height, 2);
        assert_eq!(report.weighted_height, 2.0);
        assert_eq!(report.flushes, 5);
        assert_eq!(report.absorptions.len(), 1);
        assert_eq!(report.roots.len(), 1);
    }

    #[test]
    fn test_symmetric_tree() {
        let mut ops = flushes(0..5);
        ops.push(OpId::Merge { begin: 0, end: 4 });
        ops.extend(flushes(5..10));
        ops.push(OpId::Merge { begin: 5, end: 9 });
        ops.push(OpId::Merge { begin: 0, end: 9 });

        let report = compute_heights(&ops).unwrap();
        assert_eq!(report.max_height, 3);
        assert_eq!(report.weighted_height, 3.0);
        assert_eq!(
            report.roots,
            vec![RangeHeight {
                start: 0,
                end: 9,
                max_height: 3,
                weighted_height: 3.0
            }]
        );
    }

    #[test]
    fn test_unbalanced_tree_metrics_diverge() {
        let mut ops = flushes(0..5);
        ops.push(OpId::Merge { begin: 0, end: 4 });
        ops.push(OpId::Flush(5));
        ops.push(OpId::Merge { begin: 0, end: 5 });

        let report = compute_heights(&ops).unwrap();
        assert_eq!(report.max_height, 3);
        assert!((report.weighted_height - 2.833_333_333_333_333).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_roots_take_maximum() {
        let mut ops = flushes(0..4);
        ops.push(OpId::Merge { begin: 0, end: 1 });
        ops.push(OpId::Merge { begin: 0, end: 2 });

        let report = compute_heights(&ops).unwrap();
        assert_eq!(report.roots.len(), 2);
        assert_eq!(report.max_height, 3);
        assert_eq!(report.roots[1].max_height, 1);
        // (2*2 + 1*1)/3 + 1
        assert!((report.weighted_height - (5.0 / 3.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_stream() {
        let ops: Vec<OpId> = Vec::new();
        let report = compute_heights(&ops).unwrap();
        assert_eq!(report.max_height, 0);
        assert_eq!(report.weighted_height, 0.0);
        assert!(report.roots.is_empty());
    }

    #[test]
    fn test_inconsistent_stream_errors() {
        let mut ops = flushes(0..2);
        ops.push(OpId::Merge { begin: 0, end: 3 });
        assert!(compute_heights(&ops).is_err());
    }
}
