//! Exact bit-trie with Hamming-distance range and nearest-neighbor search.

use std::collections::BinaryHeap;

use smallvec::SmallVec;

use super::{Identity, NodeInfo, SearchResult, TrieParams, TrieStats};
use crate::error::Result;
use crate::hash::ImageHash;

/// Trie node: internal nodes branch on one bit, leaves hold values.
#[derive(Debug, Clone)]
pub(crate) enum Node<T> {
    Internal {
        one: Option<Box<Node<T>>>,
        zero: Option<Box<Node<T>>>,
    },
    Leaf(SmallVec<[T; 2]>),
}

impl<T> Node<T> {
    fn internal() -> Self {
        Node::Internal {
            one: None,
            zero: None,
        }
    }

    fn leaf() -> Self {
        Node::Leaf(SmallVec::new())
    }

    fn child_slot(&mut self, bit: bool) -> &mut Option<Box<Node<T>>> {
        match self {
            Node::Internal { one, .. } if bit => one,
            Node::Internal { zero, .. } => zero,
            // Every leaf sits at exactly `depth` edges below the root.
            Node::Leaf(_) => unreachable!("trie descended below a leaf"),
        }
    }

    /// Present children as `(bit, child)`.
    fn children(&self) -> impl Iterator<Item = (bool, &Node<T>)> {
        let (one, zero) = match self {
            Node::Internal { one, zero } => (one.as_deref(), zero.as_deref()),
            Node::Leaf(_) => (None, None),
        };
        [(true, one), (false, zero)]
            .into_iter()
            .filter_map(|(bit, child)| child.map(|c| (bit, c)))
    }
}

/// Exact index of values keyed by perceptual hash.
///
/// Duplicate hashes and duplicate values are both allowed; every insert is
/// counted.
#[derive(Debug, Clone)]
pub struct BinaryTrie<T> {
    root: Node<T>,
    identity: Identity,
    hash_count: usize,
    params: TrieParams,
}

impl<T> Default for BinaryTrie<T> {
    fn default() -> Self {
        Self::with_params(TrieParams::default())
    }
}

impl<T> BinaryTrie<T> {
    /// Empty trie that enforces a single algorithm id.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: TrieParams) -> Self {
        Self {
            root: Node::internal(),
            identity: Identity::default(),
            hash_count: 0,
            params,
        }
    }

    /// Store `value` under `hash`.
    ///
    /// The first insert fixes the trie's depth (hash length) and algorithm id.
    pub fn insert(&mut self, hash: &ImageHash, value: T) -> Result<()> {
        self.identity
            .check(hash.algorithm_id(), hash.len(), self.params.ensure_consistency)?;
        self.identity.adopt(hash.algorithm_id(), hash.len());

        let mut node = &mut self.root;
        for index in (1..hash.len()).rev() {
            node = &mut **node
                .child_slot(hash.bit(index))
                .get_or_insert_with(|| Box::new(Node::internal()));
        }
        let leaf = node
            .child_slot(hash.bit(0))
            .get_or_insert_with(|| Box::new(Node::leaf()));
        match &mut **leaf {
            Node::Leaf(values) => values.push(value),
            // Lengths are checked above, so bit 0 always lands on a leaf.
            Node::Internal { .. } => unreachable!("trie leaf slot holds an internal node"),
        }

        self.hash_count += 1;
        Ok(())
    }

    /// All values within Hamming distance `max_distance` of `hash`, closest first.
    pub fn query_range(&self, hash: &ImageHash, max_distance: usize) -> Result<Vec<SearchResult<&T>>> {
        let depth = self.identity.check_query(
            hash.algorithm_id(),
            hash.len(),
            self.params.ensure_consistency,
        )?;
        let max_distance = max_distance as f64;

        let mut results = Vec::new();
        let mut frontier = BinaryHeap::new();
        frontier.push(NodeInfo::new(&self.root, 0.0, depth));
        let mut expanded = 0usize;

        while let Some(info) = frontier.pop() {
            expanded += 1;
            match info.node {
                Node::Leaf(values) => {
                    results.extend(values.iter().map(|v| SearchResult::new(v, info.distance)));
                }
                Node::Internal { .. } => {
                    let bit = hash.bit(info.remaining_depth - 1);
                    for (child_bit, child) in info.node.children() {
                        let distance = info.distance + step_cost(child_bit, bit);
                        if distance <= max_distance {
                            frontier.push(NodeInfo::new(child, distance, info.remaining_depth - 1));
                        }
                    }
                }
            }
        }

        results.sort_by(SearchResult::cmp_distance);
        tracing::trace!(expanded, matches = results.len(), "range query");
        Ok(results)
    }

    /// Every value at the minimal Hamming distance from `hash`.
    pub fn query_nearest(&self, hash: &ImageHash) -> Result<Vec<SearchResult<&T>>> {
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
            // threshold may have tightened since this entry was queued
            if info.distance > best {
                continue;
            }
            expanded += 1;
            match info.node {
                Node::Leaf(values) => {
                    if info.distance < best {
                        best = info.distance;
                        results.clear();
                    }
                    results.extend(values.iter().map(|v| SearchResult::new(v, info.distance)));
                }
                Node::Internal { .. } => {
                    let bit = hash.bit(info.remaining_depth - 1);
                    for (child_bit, child) in info.node.children() {
                        let distance = info.distance + step_cost(child_bit, bit);
                        if distance <= best {
                            frontier.push(NodeInfo::new(child, distance, info.remaining_depth - 1));
                        }
                    }
                }
            }
        }

        tracing::trace!(expanded, matches = results.len(), best, "nearest query");
        Ok(results)
    }

    /// Number of stored values (duplicates included).
    pub fn len(&self) -> usize {
        self.hash_count
    }

    pub fn is_empty(&self) -> bool {
        self.hash_count == 0
    }

    /// Algorithm id adopted from the first insert.
    pub fn algorithm_id(&self) -> Option<u32> {
        self.identity.algorithm_id()
    }

    /// Hash length adopted from the first insert.
    pub fn depth(&self) -> Option<usize> {
        self.identity.depth()
    }

    pub fn stats(&self) -> TrieStats {
        let mut node_count = 0;
        let mut leaf_count = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            node_count += 1;
            match node {
                Node::Leaf(_) => leaf_count += 1,
                Node::Internal { .. } => stack.extend(node.children().map(|(_, c)| c)),
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

#[inline]
fn step_cost(child_bit: bool, needle_bit: bool) -> f64 {
    if child_bit == needle_bit {
        0.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn h(s: &str) -> ImageHash {
        ImageHash::from_binary_str(s, 0).unwrap()
    }

    fn values<T: Copy>(results: &[SearchResult<&T>]) -> Vec<T> {
        results.iter().map(|r| *r.value).collect()
    }

    #[test]
    fn exact_match_at_radius_zero() {
        let mut trie = BinaryTrie::new();
        trie.insert(&h("101010100011"), 1).unwrap();

        let results = trie.query_range(&h("101010100011"), 0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(*results[0].value, 1);
        assert_eq!(results[0].distance, 0.0);
    }

    #[test]
    fn radius_bounds_matches() {
        let mut trie = BinaryTrie::new();
        trie.insert(&h("101010100011"), 1).unwrap();

        let results = trie.query_range(&h("101010101111"), 100).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(*results[0].value, 1);
        assert_eq!(results[0].distance, 2.0);

        assert!(trie.query_range(&h("101010101111"), 1).unwrap().is_empty());
    }

    #[test]
    fn range_results_are_sorted_by_distance() {
        let mut trie = BinaryTrie::new();
        trie.insert(&h("1111"), 'd').unwrap();
        trie.insert(&h("0000"), 'a').unwrap();
        trie.insert(&h("0011"), 'c').unwrap();
        trie.insert(&h("0001"), 'b').unwrap();

        let results = trie.query_range(&h("0000"), 4).unwrap();
        assert_eq!(values(&results), vec!['a', 'b', 'c', 'd']);
        let distances: Vec<f64> = results.iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![0.0, 1.0, 2.0, 4.0]);
    }

    #[test]
    fn nearest_single() {
        let mut trie = BinaryTrie::new();
        trie.insert(&h("10000"), 0).unwrap();
        trie.insert(&h("11111"), 1).unwrap();

        let results = trie.query_nearest(&h("00001")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(*results[0].value, 0);
        assert_eq!(results[0].distance, 2.0);
    }

    #[test]
    fn nearest_returns_all_ties() {
        let mut trie = BinaryTrie::new();
        trie.insert(&h("00010"), 0).unwrap();
        trie.insert(&h("00100"), 2).unwrap();
        trie.insert(&h("11111"), 1).unwrap();

        let results = trie.query_nearest(&h("00001")).unwrap();
        let mut found = values(&results);
        found.sort_unstable();
        assert_eq!(found, vec![0, 2]);
        assert!(results.iter().all(|r| r.distance == 2.0));
    }

    #[test]
    fn duplicates_share_a_leaf_and_are_counted() {
        let mut trie = BinaryTrie::new();
        trie.insert(&h("0110"), "x").unwrap();
        trie.insert(&h("0110"), "y").unwrap();
        trie.insert(&h("0110"), "x").unwrap();
        assert_eq!(trie.len(), 3);

        let results = trie.query_range(&h("0110"), 0).unwrap();
        assert_eq!(values(&results), vec!["x", "y", "x"]);

        let stats = trie.stats();
        assert_eq!(stats.hash_count, 3);
        assert_eq!(stats.leaf_count, 1);
        assert_eq!(stats.node_count, 5);
        assert_eq!(stats.depth, Some(4));
    }

    #[test]
    fn consistency_checking_rejects_other_algorithms() {
        let a = ImageHash::from_binary_str("1010", 1).unwrap();
        let b = ImageHash::from_binary_str("1010", 2).unwrap();

        let mut strict = BinaryTrie::new();
        strict.insert(&a, 0).unwrap();
        assert_eq!(
            strict.insert(&b, 1),
            Err(Error::IncompatibleHash {
                expected: 1,
                actual: 2
            })
        );
        assert!(strict.query_nearest(&b).is_err());
        assert_eq!(strict.len(), 1);

        let mut lenient = BinaryTrie::with_params(TrieParams {
            ensure_consistency: false,
        });
        lenient.insert(&a, 0).unwrap();
        lenient.insert(&b, 1).unwrap();
        assert_eq!(lenient.len(), 2);
        assert_eq!(lenient.query_range(&b, 0).unwrap().len(), 2);
    }

    #[test]
    fn length_mismatch_is_always_rejected() {
        let mut trie = BinaryTrie::with_params(TrieParams {
            ensure_consistency: false,
        });
        trie.insert(&h("1010"), 0).unwrap();
        assert!(matches!(
            trie.insert(&h("10101"), 1),
            Err(Error::LengthMismatch {
                expected: 4,
                actual: 5
            })
        ));
        assert!(matches!(
            trie.query_range(&h("101"), 3),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn every_accepted_insert_reaches_a_leaf() {
        let mut trie = BinaryTrie::with_params(TrieParams {
            ensure_consistency: false,
        });
        trie.insert(&h("1010"), 0).unwrap();
        assert!(trie.insert(&h("10101"), 1).is_err());
        assert!(trie.insert(&h("101"), 2).is_err());
        trie.insert(&h("1011"), 3).unwrap();
        trie.insert(&h("1010"), 4).unwrap();

        assert_eq!(trie.len(), 3);
        assert_eq!(trie.stats().leaf_count, 2);
        let mut found = values(&trie.query_range(&h("0101"), 4).unwrap());
        found.sort_unstable();
        assert_eq!(found, vec![0, 3, 4]);
    }

    #[test]
    fn empty_trie_rejects_queries() {
        let trie: BinaryTrie<u32> = BinaryTrie::new();
        assert_eq!(trie.query_nearest(&h("1")), Err(Error::EmptyIndex));
        assert_eq!(trie.query_range(&h("1"), 1), Err(Error::EmptyIndex));
        assert!(trie.is_empty());
        assert_eq!(trie.depth(), None);
    }

    #[test]
    fn single_bit_hashes() {
        let mut trie = BinaryTrie::new();
        trie.insert(&h("1"), 'a').unwrap();
        trie.insert(&h("0"), 'b').unwrap();
        assert_eq!(values(&trie.query_nearest(&h("1")).unwrap()), vec!['a']);
        assert_eq!(trie.query_range(&h("0"), 1).unwrap().len(), 2);
    }

    #[test]
    fn wide_hashes_do_not_recurse() {
        let len = 4096;
        let ones: String = "1".repeat(len);
        let mut flipped = ones.clone();
        flipped.replace_range(10..13, "000");

        let mut trie = BinaryTrie::new();
        trie.insert(&h(&ones), 1).unwrap();
        trie.insert(&h(&"0".repeat(len)), 0).unwrap();

        let nearest = trie.query_nearest(&h(&flipped)).unwrap();
        assert_eq!(values(&nearest), vec![1]);
        assert_eq!(nearest[0].distance, 3.0);
    }

    #[test]
    fn queries_run_in_parallel_on_a_shared_trie() {
        let mut trie = BinaryTrie::new();
        for i in 0u32..64 {
            let bits: String = (0..8).rev().map(|b| if i >> b & 1 == 1 { '1' } else { '0' }).collect();
            trie.insert(&h(&bits), i).unwrap();
        }
        let trie = &trie;
        std::thread::scope(|s| {
            for i in 0u32..4 {
                s.spawn(move || {
                    let bits: String = (0..8).rev().map(|b| if i >> b & 1 == 1 { '1' } else { '0' }).collect();
                    let nearest = trie.query_nearest(&h(&bits)).unwrap();
                    assert_eq!(values(&nearest), vec![i]);
                });
            }
        });
    }
}
