//! Query results and search frontier entries.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A matched value and its distance to the query.
///
/// Equality and hashing consider the value only: the same value found twice
/// is the same match regardless of the distance it was reached at. Order by
/// distance with [`SearchResult::cmp_distance`].
#[derive(Debug, Clone, Copy)]
pub struct SearchResult<T> {
    pub value: T,
    pub distance: f64,
}

impl<T> SearchResult<T> {
    pub fn new(value: T, distance: f64) -> Self {
        Self { value, distance }
    }

    /// Total order by distance ascending.
    pub fn cmp_distance(&self, other: &Self) -> Ordering {
        self.distance.total_cmp(&other.distance)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SearchResult<U> {
        SearchResult {
            value: f(self.value),
            distance: self.distance,
        }
    }
}

impl<T: PartialEq> PartialEq for SearchResult<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for SearchResult<T> {}

impl<T: Hash> Hash for SearchResult<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

/// Frontier entry of a best-first trie traversal.
///
/// `distance` is the cost accumulated on the path to `node`, a lower bound for
/// every value below it. Heap order pops the fewest `remaining_depth` first,
/// then the smallest `distance`.
#[derive(Debug)]
pub struct NodeInfo<'a, N> {
    pub node: &'a N,
    pub distance: f64,
    pub remaining_depth: usize,
}

impl<'a, N> NodeInfo<'a, N> {
    pub fn new(node: &'a N, distance: f64, remaining_depth: usize) -> Self {
        Self {
            node,
            distance,
            remaining_depth,
        }
    }
}

impl<N> PartialEq for NodeInfo<'_, N> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N> Eq for NodeInfo<'_, N> {}

impl<N> Ord for NodeInfo<'_, N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse both keys
        other
            .remaining_depth
            .cmp(&self.remaining_depth)
            .then_with(|| other.distance.total_cmp(&self.distance))
    }
}

impl<N> PartialOrd for NodeInfo<'_, N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
