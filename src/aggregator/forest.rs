//! Interval forest over flush ids.
//!
//! Every flush adds a leaf covering its own id. Every merge absorbs the
//! live nodes that tile its declared range and replaces them with one
//! parent node. Nodes live in an arena and are never freed, so absorbed
//! children stay reachable from their parent; the `live` index maps the
//! start id of each not-yet-absorbed node to its arena slot.
//!
//! Live ranges always partition the ids seen so far: they are disjoint
//! and, for a well-formed stream, their union is `0..counter`.

use crate::lineage::schema::OpId;
use crate::utils::error::ForestError;
use log::debug;
use std::collections::BTreeMap;

/// One component in the forest
#[derive(Debug, Clone, PartialEq)]
pub struct ForestNode {
    pub start: u64,
    pub end: u64,

    /// Longest merge chain below this node, leaves count as 1
    pub max_height: u32,

    /// Leaf-count weighted mean depth of this node, leaves count as 1.0
    pub weighted_height: f64,

    /// Arena slots of absorbed children, in id order
    pub children: Vec<usize>,
}

impl ForestNode {
    fn leaf(id: u64) -> Self {
        Self {
            start: id,
            end: id,
            max_height: 1,
            weighted_height: 1.0,
            children: Vec::new(),
        }
    }

    /// Number of flush ids covered
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena of nodes plus the live start-id index
#[derive(Debug, Clone, Default)]
pub struct ForestState {
    nodes: Vec<ForestNode>,
    live: BTreeMap<u64, usize>,
}

impl ForestState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one operation to the forest
    ///
    /// **Public** - main entry point for forest construction
    ///
    /// # Returns
    /// Arena slot of the node created by the operation
    pub fn apply(&mut self, op: &OpId) -> Result<usize, ForestError> {
        match *op {
            OpId::Flush(id) => self.insert_leaf(id),
            OpId::Merge { begin, end } => self.absorb(begin, end),
        }
    }

    /// Add a leaf for a completed flush
    ///
    /// # Errors
    /// * `ForestError::DuplicateLeaf` - The id is already covered by a live node
    pub fn insert_leaf(&mut self, id: u64) -> Result<usize, ForestError> {
        if self.live_covering(id).is_some() {
            return Err(ForestError::DuplicateLeaf(id));
        }

        let slot = self.push(ForestNode::leaf(id));
        self.live.insert(id, slot);
        Ok(slot)
    }

    /// Replace the live nodes tiling `begin..=end` by their parent
    ///
    /// The forest is left untouched when the range is rejected.
    ///
    /// # Errors
    /// * `ForestError::InvalidRange` - `begin > end`
    /// * `ForestError::NonContiguousMergeRange` - Live nodes do not tile the range
    pub fn absorb(&mut self, begin: u64, end: u64) -> Result<usize, ForestError> {
        if begin > end {
            return Err(ForestError::InvalidRange { begin, end });
        }

        let children = self.tiling_run(begin, end)?;

        let mut max_child = 0;
        let mut total_weighted = 0.0;
        let mut total_count = 0.0;
        for &slot in &children {
            let child = &self.nodes[slot];
            let count = child.size() as f64;
            max_child = max_child.max(child.max_height);
            total_weighted += child.weighted_height * count;
            total_count += count;
        }
        for &slot in &children {
            self.live.remove(&self.nodes[slot].start);
        }

        let node = ForestNode {
            start: begin,
            end,
            max_height: max_child + 1,
            weighted_height: total_weighted / total_count + 1.0,
            children,
        };
        debug!(
            "[{}-{}] absorbed {} range(s): max {} weighted {}",
            begin,
            end,
            node.children.len(),
            node.max_height,
            node.weighted_height
        );

        let slot = self.push(node);
        self.live.insert(begin, slot);
        Ok(slot)
    }

    /// Collect the live nodes that exactly tile `begin..=end`
    ///
    /// **Private** - validation for absorb
    fn tiling_run(&self, begin: u64, end: u64) -> Result<Vec<usize>, ForestError> {
        let reject = |reason: String| ForestError::NonContiguousMergeRange { begin, end, reason };

        let mut children = Vec::new();
        let mut next = begin;
        loop {
            let Some(&slot) = self.live.get(&next) else {
                let reason = match self.live_covering(next) {
                    Some(n) => format!("id {} is inside live range {}-{}", next, n.start, n.end),
                    None => format!("no live range starts at {}", next),
                };
                return Err(reject(reason));
            };
            let node = &self.nodes[slot];
            if node.end > end {
                return Err(reject(format!(
                    "live range {}-{} extends past {}",
                    node.start, node.end, end
                )));
            }

            children.push(slot);
            if node.end == end {
                return Ok(children);
            }
            next = node.end + 1;
        }
    }

    /// Live node whose range contains `id`
    fn live_covering(&self, id: u64) -> Option<&ForestNode> {
        self.live
            .range(..=id)
            .next_back()
            .map(|(_, &slot)| &self.nodes[slot])
            .filter(|node| node.end >= id)
    }

    fn push(&mut self, node: ForestNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn node(&self, slot: usize) -> &ForestNode {
        &self.nodes[slot]
    }

    /// Every node ever created, in creation order
    pub fn nodes(&self) -> &[ForestNode] {
        &self.nodes
    }

    /// Nodes not yet absorbed, ordered by start id
    pub fn live_nodes(&self) -> impl Iterator<Item = &ForestNode> + '_ {
        self.live.values().map(move |&slot| &self.nodes[slot])
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Highest max-metric height among live nodes, 0 when empty
    pub fn max_height(&self) -> u32 {
        self.live_nodes().map(|n| n.max_height).max().unwrap_or(0)
    }

    /// Highest weighted-metric height among live nodes, 0.0 when empty
    pub fn weighted_height(&self) -> f64 {
        self.live_nodes()
            .map(|n| n.weighted_height)
            .fold(0.0, f64::max)
    }

    /// Whether live ranges tile `0..counter` without gaps or overlaps
    pub fn is_partition_of(&self, counter: u64) -> bool {
        let mut next = 0;
        for node in self.live_nodes() {
            if node.start != next {
                return false;
            }
            next = node.end + 1;
        }
        next == counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(forest: &mut ForestState, ids: std::ops::Range<u64>) {
        for id in ids {
            forest.insert_leaf(id).unwrap();
        }
    }

    #[test]
    fn test_leaf_heights() {
        let mut forest = ForestState::new();
        let slot = forest.insert_leaf(0).unwrap();

        assert_eq!(forest.node(slot).max_height, 1);
        assert_eq!(forest.node(slot).weighted_height, 1.0);
        assert!(forest.node(slot).is_leaf());
    }

    #[test]
    fn test_absorb_flat_run() {
        let mut forest = ForestState::new();
        leaves(&mut forest, 0..5);
        let slot = forest.absorb(0, 4).unwrap();

        let node = forest.node(slot);
        assert_eq!(node.size(), 5);
        assert_eq!(node.children.len(), 5);
        assert_eq!(node.max_height, 2);
        assert_eq!(node.weighted_height, 2.0);
        assert_eq!(forest.live_count(), 1);
        assert!(forest.is_partition_of(5));
    }

    #[test]
    fn test_weighted_height_follows_child_sizes() {
        let mut forest = ForestState::new();
        leaves(&mut forest, 0..5);
        forest.absorb(0, 4).unwrap();
        forest.insert_leaf(5).unwrap();
        let slot = forest.absorb(0, 5).unwrap();

        let node = forest.node(slot);
        assert_eq!(node.max_height, 3);
        assert!((node.weighted_height - (2.0 * 5.0 + 1.0) / 6.0 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_gap_rejected_without_mutation() {
        let mut forest = ForestState::new();
        leaves(&mut forest, 0..3);
        let err = forest.absorb(0, 4).unwrap_err();

        assert!(matches!(err, ForestError::NonContiguousMergeRange { begin: 0, end: 4, .. }));
        assert_eq!(forest.live_count(), 3);
    }

    #[test]
    fn test_range_starting_inside_live_node_rejected() {
        let mut forest = ForestState::new();
        leaves(&mut forest, 0..4);
        forest.absorb(0, 2).unwrap();

        assert!(forest.absorb(1, 3).is_err());
        assert!(forest.absorb(0, 1).is_err());
        assert!(forest.is_partition_of(4));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut forest = ForestState::new();
        leaves(&mut forest, 0..2);
        assert!(matches!(
            forest.absorb(1, 0),
            Err(ForestError::InvalidRange { begin: 1, end: 0 })
        ));
    }

    #[test]
    fn test_duplicate_leaf_rejected() {
        let mut forest = ForestState::new();
        leaves(&mut forest, 0..3);
        forest.absorb(0, 2).unwrap();

        assert!(matches!(forest.insert_leaf(1), Err(ForestError::DuplicateLeaf(1))));
        assert!(matches!(forest.insert_leaf(0), Err(ForestError::DuplicateLeaf(0))));
    }

    #[test]
    fn test_empty_forest_heights() {
        let forest = ForestState::new();
        assert_eq!(forest.max_height(), 0);
        assert_eq!(forest.weighted_height(), 0.0);
        assert!(forest.is_partition_of(0));
    }
}
