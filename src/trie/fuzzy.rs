//! Bit-trie over [`FuzzyHash`]es.
//!
//! Each fuzzy hash is filed under its consensus bits. Because the stored
//! hashes are uncertain, descending a branch no longer has a fixed cost of 0
//! or 1. Instead every node remembers the smallest and largest per-bit cost
//! (`lower`, `upper`) that any hash filed through it assigns to its own
//! consensus bit on that edge:
//!
//! - needle bit equals the branch bit: each hash below costs at least `lower`;
//! - needle bit differs: the cost is the complement `1 - w` of the hash's own
//!   cost `w ≤ upper`, so at least `1 - upper`.
//!
//! Summing these per-edge bounds gives a lower bound on the weighted distance
//! of every hash in a subtree, which drives the same branch-and-bound search
//! as [`BinaryTrie::query_nearest`](super::BinaryTrie::query_nearest). Leaves
//! still compute the exact weighted distance of each stored hash; the bounds
//! only decide what to visit.
//!
//! Radius queries are not offered: a fixed radius has no clear meaning for
//! probabilistic distances.

use std::collections::BinaryHeap;

use smallvec::SmallVec;

use super::{Identity, NodeInfo, SearchResult, TrieParams, TrieStats};
use crate::error::Result;
use crate::hash::{FuzzyHash, ImageHash};

/// Tolerance for treating two weighted distances as a tie.
pub const DISTANCE_EPSILON: f64 = 1e-9;

/// Envelope of per-bit costs seen on the edge into a node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DistanceBounds {
    lower: f64,
    upper: f64,
}

impl Default for DistanceBounds {
    fn default() -> Self {
        Self {
            lower: f64::INFINITY,
            upper: f64::NEG_INFINITY,
        }
    }
}

impl DistanceBounds {
    /// Widen to cover `cost`; bounds never shrink.
    fn include(&mut self, cost: f64) {
        self.lower = self.lower.min(cost);
        self.upper = self.upper.max(cost);
    }

    /// Minimum cost of entering this node for a needle bit.
    fn min_cost(&self, branch_bit: bool, needle_bit: bool) -> f64 {
        if branch_bit == needle_bit {
            self.lower
        } else {
            1.0 - self.upper
        }
    }
}

#[derive(Debug, Clone)]
enum FuzzyKind {
    Internal {
        one: Option<Box<FuzzyNode>>,
        zero: Option<Box<FuzzyNode>>,
    },
    Leaf(SmallVec<[FuzzyHash; 1]>),
}

#[derive(Debug, Clone)]
pub(crate) struct FuzzyNode {
    bounds: DistanceBounds,
    kind: FuzzyKind,
}

impl FuzzyNode {
    fn internal() -> Self {
        Self {
            bounds: DistanceBounds::default(),
            kind: FuzzyKind::Internal {
                one: None,
                zero: None,
            },
        }
    }

    fn leaf() -> Self {
        Self {
            bounds: DistanceBounds::default(),
            kind: FuzzyKind::Leaf(SmallVec::new()),
        }
    }

    fn child_slot(&mut self, bit: bool) -> &mut Option<Box<FuzzyNode>> {
        match &mut self.kind {
            FuzzyKind::Internal { one, .. } if bit => one,
            FuzzyKind::Internal { zero, .. } => zero,
            FuzzyKind::Leaf(_) => unreachable!("fuzzy trie descended below a leaf"),
        }
    }

    fn children(&self) -> impl Iterator<Item = (bool, &FuzzyNode)> {
        let (one, zero) = match &self.kind {
            FuzzyKind::Internal { one, zero } => (one.as_deref(), zero.as_deref()),
            FuzzyKind::Leaf(_) => (None, None),
        };
        [(true, one), (false, zero)]
            .into_iter()
            .filter_map(|(bit, child)| child.map(|c| (bit, c)))
    }
}

/// Index of fuzzy hashes searchable by crisp needles.
#[derive(Debug, Clone)]
pub struct FuzzyTrie {
    root: FuzzyNode,
    identity: Identity,
    hash_count: usize,
    params: TrieParams,
}

impl Default for FuzzyTrie {
    fn default() -> Self {
        Self::with_params(TrieParams::default())
    }
}

impl FuzzyTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: TrieParams) -> Self {
        Self {
            root: FuzzyNode::internal(),
            identity: Identity::default(),
            hash_count: 0,
            params,
        }
    }

    /// File `fuzzy` under its consensus bits, widening the bounds of every
    /// node on the way.
    pub fn insert(&mut self, fuzzy: FuzzyHash) -> Result<()> {
        let len = fuzzy.len();
        self.identity
            .check(fuzzy.algorithm_id(), len, self.params.ensure_consistency)?;
        self.identity.adopt(fuzzy.algorithm_id(), len);

        let mut node = &mut self.root;
        for index in (0..len).rev() {
            let bit = fuzzy.consensus_bit(index);
            let make = if index == 0 {
                FuzzyNode::leaf
            } else {
                FuzzyNode::internal
            };
            node = &mut **node
                .child_slot(bit)
                .get_or_insert_with(|| Box::new(make()));
            node.bounds.include(fuzzy.bit_distance(index, bit));
        }
        match &mut node.kind {
            FuzzyKind::Leaf(values) => values.push(fuzzy),
            // Lengths are checked above, so the walk always ends on a leaf.
            FuzzyKind::Internal { .. } => unreachable!("fuzzy trie walk ended on an internal node"),
        }

        self.hash_count += 1;
        Ok(())
    }

    /// Every stored fuzzy hash at the minimal weighted distance from `hash`.
    ///
    /// Distances within [`DISTANCE_EPSILON`] of the best are reported as ties.
    pub fn query_nearest(&self, hash: &ImageHash) -> Result<Vec<SearchResult<&FuzzyHash>>> {
        let depth = self.identity.check_query(
            hash.algorithm_id(),
            hash.len(),
            self.params.ensure_consistency,
        )?;

        let mut best = f64::INFINITY;
        let mut results = Vec::new();
        let mut frontier = BinaryHeap::new();
        frontier.push(NodeInfo::new(&self.root, 0.0, depth));
        let mut expanded = 0usize;

        while let Some(info) = frontier.pop() {
            if info.distance > best + DISTANCE_EPSILON {
                continue;
            }
            expanded += 1;
            match &info.node.kind {
                FuzzyKind::Leaf(values) => {
                    for fuzzy in values {
                        let distance = fuzzy.weighted_distance(hash);
                        if distance < best - DISTANCE_EPSILON {
                            results.clear();
                        }
                        if distance <= best + DISTANCE_EPSILON {
                            best = best.min(distance);
                            results.push(SearchResult::new(fuzzy, distance));
                        }
                    }
                }
                FuzzyKind::Internal { .. } => {
                    let index = info.remaining_depth - 1;
                    let bit = hash.bit(index);
                    for (child_bit, child) in info.node.children() {
                        let distance = info.distance + child.bounds.min_cost(child_bit, bit);
                        if distance <= best + DISTANCE_EPSILON {
                            frontier.push(NodeInfo::new(child, distance, index));
                        }
                    }
                }
            }
        }

        results.sort_by(SearchResult::cmp_distance);
        tracing::trace!(expanded, matches = results.len(), best, "fuzzy nearest query");
        Ok(results)
    }

    /// Number of inserted fuzzy hashes.
    pub fn len(&self) -> usize {
        self.hash_count
    }

    pub fn is_empty(&self) -> bool {
        self.hash_count == 0
    }

    pub fn algorithm_id(&self) -> Option<u32> {
        self.identity.algorithm_id()
    }

    pub fn depth(&self) -> Option<usize> {
        self.identity.depth()
    }

    pub fn stats(&self) -> TrieStats {
        let mut node_count = 0;
        let mut leaf_count = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            node_count += 1;
            match node.kind {
                FuzzyKind::Leaf(_) => leaf_count += 1,
                FuzzyKind::Internal { .. } => stack.extend(node.children().map(|(_, c)| c)),
            }
        }
        TrieStats {
            hash_count: self.hash_count,
            node_count,
            leaf_count,
            depth: self.identity.depth(),
        }
    }
}
