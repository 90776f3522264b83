//! Bit-trie indexes over perceptual hashes.
//!
//! A [`BinaryTrie`] stores each hash as a root-to-leaf path, one edge per bit,
//! starting at the most significant bit. Values whose hashes are bit-for-bit
//! identical share a leaf.
//!
//! ## Search
//!
//! Both query types are best-first branch-and-bound traversals over an
//! explicit frontier (a binary heap of [`NodeInfo`]); neither recurses, so
//! hashes of thousands of bits are fine.
//!
//! - At an internal node, the child on the needle's bit costs `0`, the other
//!   child costs `1`. The accumulated cost is a lower bound for every hash in
//!   the subtree, because the remaining bits could all still match.
//! - A range query enqueues a child only while that bound stays within the
//!   radius.
//! - A nearest query starts with an infinite threshold and tightens it to the
//!   best leaf seen; anything worse is dropped without being expanded.
//!
//! The frontier pops the node with the fewest remaining bits first, then the
//! lowest cost. Leaves are therefore reached early and the nearest-neighbor
//! threshold drops quickly, which is what prunes most of the trie.
//!
//! ```rust
//! use glimpse::hash::ImageHash;
//! use glimpse::trie::BinaryTrie;
//!
//! let mut trie = BinaryTrie::new();
//! trie.insert(&ImageHash::from_binary_str("00010", 0).unwrap(), 0).unwrap();
//! trie.insert(&ImageHash::from_binary_str("00100", 0).unwrap(), 2).unwrap();
//! trie.insert(&ImageHash::from_binary_str("11111", 0).unwrap(), 1).unwrap();
//!
//! let needle = ImageHash::from_binary_str("00001", 0).unwrap();
//! let nearest = trie.query_nearest(&needle).unwrap();
//! assert_eq!(nearest.len(), 2); // values 0 and 2, both at distance 2
//! ```
//!
//! ## Concurrency
//!
//! `insert` takes `&mut self` and queries take `&self`, so the borrow checker
//! enforces the single-writer discipline. Share a trie between threads behind
//! a `RwLock` (or funnel inserts through one owner); queries on a shared
//! reference are pure reads and run in parallel.

mod binary;
#[cfg(feature = "fuzzy")]
pub mod fuzzy;
mod result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use binary::BinaryTrie;
#[cfg(feature = "fuzzy")]
pub use fuzzy::FuzzyTrie;
pub use result::{NodeInfo, SearchResult};

/// Trie construction parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrieParams {
    /// Reject hashes whose algorithm id differs from the first inserted hash.
    ///
    /// Bit length is always enforced regardless of this flag.
    pub ensure_consistency: bool,
}

impl Default for TrieParams {
    fn default() -> Self {
        Self {
            ensure_consistency: true,
        }
    }
}

/// Structural statistics of a trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieStats {
    /// Stored values, duplicates included.
    pub hash_count: usize,
    /// Nodes including the root and the leaves.
    pub node_count: usize,
    pub leaf_count: usize,
    /// Bits per hash, `None` until the first insert.
    pub depth: Option<usize>,
}

/// Algorithm id and depth a trie adopts from its first insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Identity {
    algorithm_id: Option<u32>,
    depth: Option<usize>,
}

impl Identity {
    pub(crate) fn algorithm_id(&self) -> Option<u32> {
        self.algorithm_id
    }

    pub(crate) fn depth(&self) -> Option<usize> {
        self.depth
    }

    /// Validate a hash against the established identity (if any).
    pub(crate) fn check(&self, algorithm_id: u32, len: usize, ensure_consistency: bool) -> Result<()> {
        if len == 0 {
            return Err(Error::LengthMismatch {
                expected: self.depth.unwrap_or(1),
                actual: 0,
            });
        }
        if let Some(depth) = self.depth {
            if depth != len {
                return Err(Error::LengthMismatch {
                    expected: depth,
                    actual: len,
                });
            }
        }
        if ensure_consistency {
            if let Some(expected) = self.algorithm_id {
                if expected != algorithm_id {
                    return Err(Error::IncompatibleHash {
                        expected,
                        actual: algorithm_id,
                    });
                }
            }
        }
        Ok(())
    }

    /// Adopt `algorithm_id` and `len` if nothing has been inserted yet.
    pub(crate) fn adopt(&mut self, algorithm_id: u32, len: usize) {
        if self.depth.is_none() {
            tracing::debug!(algorithm_id, depth = len, "trie identity established");
            self.algorithm_id = Some(algorithm_id);
            self.depth = Some(len);
        }
    }

    /// Validate a query needle; an empty trie has nothing to compare against.
    pub(crate) fn check_query(
        &self,
        algorithm_id: u32,
        len: usize,
        ensure_consistency: bool,
    ) -> Result<usize> {
        let depth = self.depth.ok_or(Error::EmptyIndex)?;
        self.check(algorithm_id, len, ensure_consistency)?;
        Ok(depth)
    }
}
