use lsm_lineage::aggregator::{compute_heights, ForestState};
use lsm_lineage::lineage::OpId;
use lsm_lineage::utils::ForestError;

/// Tiered compaction: once more than `fan_in` ranges are live, the newest
/// `fan_in` of them are merged.
fn tiered_ops(flushes: u64, fan_in: usize) -> Vec<OpId> {
    let mut forest = ForestState::new();
    let mut ops = Vec::new();

    for id in 0..flushes {
        let op = OpId::Flush(id);
        forest.apply(&op).unwrap();
        ops.push(op);

        while forest.live_count() > fan_in {
            let tail: Vec<(u64, u64)> = forest
                .live_nodes()
                .map(|n| (n.start, n.end))
                .collect::<Vec<_>>()
                .split_off(forest.live_count() - fan_in);
            let op = OpId::Merge {
                begin: tail[0].0,
                end: tail[fan_in - 1].1,
            };
            forest.apply(&op).unwrap();
            ops.push(op);
        }
    }
    ops
}

#[test]
fn test_partition_holds_after_every_op() {
    let mut forest = ForestState::new();
    let mut counter = 0;

    for op in tiered_ops(40, 3) {
        forest.apply(&op).unwrap();
        if let OpId::Flush(_) = op {
            counter += 1;
        }
        assert!(forest.is_partition_of(counter), "partition broken after {:?}", op);
    }
}

#[test]
fn test_merge_heights_bounded_by_children() {
    let mut forest = ForestState::new();

    for op in tiered_ops(40, 3) {
        let slot = forest.apply(&op).unwrap();
        let node = forest.node(slot).clone();
        if node.is_leaf() {
            continue;
        }

        let children: Vec<_> = node.children.iter().map(|&c| forest.node(c)).collect();
        let max_child = children.iter().map(|c| c.max_height).max().unwrap();
        let min_weighted = children.iter().map(|c| c.weighted_height).fold(f64::MAX, f64::min);
        let max_weighted = children.iter().map(|c| c.weighted_height).fold(0.0, f64::max);

        assert_eq!(node.max_height, max_child + 1);
        assert!(children.iter().all(|c| node.max_height > c.max_height));
        assert!(node.weighted_height >= min_weighted + 1.0 - 1e-12);
        assert!(node.weighted_height <= max_weighted + 1.0 + 1e-12);
        assert_eq!(children.iter().map(|c| c.size()).sum::<u64>(), node.size());
    }
}

#[test]
fn test_weighted_never_exceeds_max() {
    let report = compute_heights(&tiered_ops(100, 4)).unwrap();
    assert!(report.max_height >= 2);
    assert!(report.weighted_height <= report.max_height as f64);
    assert!(report.weighted_height >= 1.0);
}

#[test]
fn test_recomputation_is_deterministic() {
    let ops = tiered_ops(60, 3);
    assert_eq!(compute_heights(&ops).unwrap(), compute_heights(&ops).unwrap());
}

#[test]
fn test_two_levels_of_five() {
    let mut ops: Vec<OpId> = (0..5).map(OpId::Flush).collect();
    ops.push(OpId::Merge { begin: 0, end: 4 });
    ops.extend((5..10).map(OpId::Flush));
    ops.push(OpId::Merge { begin: 5, end: 9 });
    ops.push(OpId::Merge { begin: 0, end: 9 });

    let report = compute_heights(&ops).unwrap();
    assert_eq!(report.max_height, 3);
    assert_eq!(report.weighted_height, 3.0);
    assert_eq!(report.absorptions.len(), 3);
    assert_eq!(report.roots.len(), 1);
}

#[test]
fn test_merge_over_absorbed_range_rejected() {
    let mut ops: Vec<OpId> = (0..4).map(OpId::Flush).collect();
    ops.push(OpId::Merge { begin: 0, end: 3 });
    ops.push(OpId::Merge { begin: 1, end: 3 });

    assert!(matches!(
        compute_heights(&ops),
        Err(ForestError::NonContiguousMergeRange { begin: 1, end: 3, .. })
    ));
}
