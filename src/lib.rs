//! glimpse: perceptual image hashing and Hamming-space similarity search.
//!
//! Provides feature-extraction algorithms that turn an image into a compact
//! bit string, plus bit-trie indexes that find stored hashes close to a query:
//!
//! - `algorithm/`: Hashing algorithms (average, difference, block median, DCT)
//! - `hash/`: Hash values, the bit builder, merged (fuzzy) hashes
//! - `trie/`: Exact and fuzzy bit-trie indexes with range and nearest queries
//!
//! ```rust
//! use glimpse::algorithm::{AverageHash, HashingAlgorithm};
//! use glimpse::trie::BinaryTrie;
//! use image::{DynamicImage, GrayImage};
//!
//! let hasher = AverageHash::new(64)?;
//! let img = DynamicImage::ImageLuma8(GrayImage::from_fn(32, 32, |x, y| {
//!     image::Luma([(x * 7 + y) as u8])
//! }));
//!
//! let mut trie = BinaryTrie::new();
//! trie.insert(&hasher.hash(&img), "original")?;
//!
//! let found = trie.query_range(&hasher.hash(&img), 4)?;
//! assert_eq!(*found[0].value, "original");
//! assert_eq!(found[0].distance, 0.0);
//! # Ok::<(), glimpse::Error>(())
//! ```
//!
//! # Critical Nuances
//!
//! ## Hashes Are Only Comparable Within One Algorithm
//!
//! Every hash carries the id of the algorithm configuration that produced it.
//! Two hashes with different ids may have the same length and still mean
//! entirely different things (an average-hash bit is "brighter than mean",
//! a difference-hash bit is "brighter than neighbor"). Indexes adopt the id of
//! their first insert and, by default, reject everything else.
//!
//! ## Requested vs. Actual Resolution
//!
//! Each algorithm lays its samples out on a grid, so the requested bit count
//! is rounded to the nearest count the grid can produce. The actual count is
//! reported by [`HashingAlgorithm::key_resolution`] and logged at `debug`
//! level when it differs.
//!
//! ## Distance Is Not Similarity Everywhere
//!
//! Perceptual hashes are robust to rescaling, recompression and mild color
//! shifts, not to crops, rotations or mirroring. A small Hamming distance is
//! strong evidence of a near-duplicate; a large one is weak evidence of
//! anything.
//!
//! # Features
//!
//! - `fuzzy` (default): [`FuzzyHash`] and the fuzzy trie
//! - `parallel`: [`algorithm::hash_all`] over rayon
//! - `serde`: serialization of hashes and trie parameters

pub mod algorithm;
pub mod error;
pub mod hash;
pub mod trie;

// Re-exports
pub use algorithm::HashingAlgorithm;
pub use error::{Error, Result};
#[cfg(feature = "fuzzy")]
pub use hash::FuzzyHash;
pub use hash::ImageHash;
#[cfg(feature = "fuzzy")]
pub use trie::FuzzyTrie;
pub use trie::{BinaryTrie, SearchResult, TrieParams};
