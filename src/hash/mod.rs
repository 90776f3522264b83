//! Perceptual hash values.
//!
//! An [`ImageHash`] is a fixed-length bit vector tagged with the identity of
//! the algorithm that produced it. Two hashes only mean something relative to
//! each other when that identity matches; comparing a difference hash with an
//! average hash yields a number, but not a distance.
//!
//! ## Bit order
//!
//! Bit `i` has significance `2^i`. Algorithms emit bits through a
//! [`HashBuilder`], which places each new bit above all previous ones, so the
//! first sample in scan order is bit 0 and the last is the most significant
//! bit. The textual form is written most significant bit first, like a binary
//! literal:
//!
//! ```rust
//! use glimpse::hash::ImageHash;
//!
//! let h = ImageHash::from_binary_str("1011", 0).unwrap();
//! assert!(h.bit(0) && h.bit(1) && !h.bit(2) && h.bit(3));
//! assert_eq!(h.to_binary_string(), "1011");
//! ```
//!
//! ## Distance
//!
//! Hamming distance is computed as popcount over the XOR of the backing
//! words, so hashes of several thousand bits cost a few dozen instructions.
//!
//! ```rust
//! use glimpse::hash::ImageHash;
//!
//! let a = ImageHash::from_binary_str("101010100011", 1).unwrap();
//! let b = ImageHash::from_binary_str("101010101111", 1).unwrap();
//! assert_eq!(a.hamming_distance(&b), 2);
//! assert!((a.normalized_hamming_distance(&b) - 2.0 / 12.0).abs() < 1e-12);
//! ```

pub mod bits;
mod builder;
#[cfg(feature = "fuzzy")]
pub mod fuzzy;

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use bits::BitVector;
pub use builder::HashBuilder;
#[cfg(feature = "fuzzy")]
pub use fuzzy::FuzzyHash;

/// An immutable perceptual hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageHash {
    bits: BitVector,
    algorithm_id: u32,
}

impl ImageHash {
    /// Wrap raw bits.
    ///
    /// Fails if `bits` is empty.
    pub fn new(bits: BitVector, algorithm_id: u32) -> Result<Self> {
        if bits.is_empty() {
            return Err(Error::InvalidParameter(
                "hash must contain at least one bit".to_string(),
            ));
        }
        Ok(Self::from_bits(bits, algorithm_id))
    }

    /// Build from raw words (least significant first) and an explicit length.
    pub fn from_words(words: Vec<u64>, len: usize, algorithm_id: u32) -> Result<Self> {
        Self::new(BitVector::from_words(words, len), algorithm_id)
    }

    /// Parse a binary literal such as `"10110"` (most significant bit first).
    pub fn from_binary_str(s: &str, algorithm_id: u32) -> Result<Self> {
        let len = s.len();
        let mut bits = BitVector::zeros(len);
        for (pos, c) in s.chars().enumerate() {
            let index = len - 1 - pos;
            match c {
                '1' => bits.set(index, true),
                '0' => {}
                other => {
                    return Err(Error::InvalidParameter(format!(
                        "invalid binary digit {other:?} in hash literal"
                    )))
                }
            }
        }
        Self::new(bits, algorithm_id)
    }

    pub(crate) fn from_bits(bits: BitVector, algorithm_id: u32) -> Self {
        debug_assert!(!bits.is_empty());
        Self { bits, algorithm_id }
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Identity of the producing algorithm.
    #[inline]
    pub fn algorithm_id(&self) -> u32 {
        self.algorithm_id
    }

    /// Bit at `index`, indexed by significance: bit `i` weighs `2^i`.
    ///
    /// `bit(len - 1)` is the most significant bit. It is the first character
    /// of [`to_binary_string`](Self::to_binary_string) and the first edge a
    /// trie walks. `bit(0)` is the first bit an algorithm emits and the last
    /// edge, the one leading to the leaf.
    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        self.bits.get(index)
    }

    pub fn bits(&self) -> &BitVector {
        &self.bits
    }

    /// Number of differing bits.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ. Algorithm identity is not checked; use
    /// [`ImageHash::try_hamming_distance`] for that.
    pub fn hamming_distance(&self, other: &ImageHash) -> usize {
        assert_eq!(self.len(), other.len(), "hash length mismatch");
        self.bits.hamming_distance(&other.bits)
    }

    /// Hamming distance divided by the hash length, in `[0, 1]`.
    pub fn normalized_hamming_distance(&self, other: &ImageHash) -> f64 {
        self.hamming_distance(other) as f64 / self.len() as f64
    }

    /// Hamming distance after checking that both hashes are comparable.
    pub fn try_hamming_distance(&self, other: &ImageHash) -> Result<usize> {
        self.check_compatible(other.algorithm_id, other.len())?;
        Ok(self.bits.hamming_distance(&other.bits))
    }

    /// Most-significant-first binary representation.
    pub fn to_binary_string(&self) -> String {
        (0..self.len())
            .rev()
            .map(|i| if self.bit(i) { '1' } else { '0' })
            .collect()
    }

    pub(crate) fn check_compatible(&self, algorithm_id: u32, len: usize) -> Result<()> {
        if self.algorithm_id != algorithm_id {
            return Err(Error::IncompatibleHash {
                expected: self.algorithm_id,
                actual: algorithm_id,
            });
        }
        if self.len() != len {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                actual: len,
            });
        }
        Ok(())
    }
}

impl fmt::Display for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_binary_string())
    }
}
