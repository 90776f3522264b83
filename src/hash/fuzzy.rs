//! Merged hashes with per-bit confidence.
//!
//! A [`FuzzyHash`] aggregates several [`ImageHash`]es of the same algorithm,
//! e.g. several photos of one subject. Instead of a crisp bit it keeps, for
//! every position, how often that bit was set. Distance to a crisp hash is
//! then weighted: disagreeing with a bit every merged hash agreed on costs 1,
//! disagreeing with a coin flip costs 0.5.
//!
//! ```rust
//! use glimpse::hash::{FuzzyHash, ImageHash};
//!
//! let a = ImageHash::from_binary_str("1100", 0).unwrap();
//! let b = ImageHash::from_binary_str("1010", 0).unwrap();
//!
//! let mut fuzzy = FuzzyHash::from_hash(&a);
//! fuzzy.merge(&b).unwrap();
//!
//! // Bits 3 and 0 are certain; bits 2 and 1 are split evenly.
//! assert_eq!(fuzzy.weighted_distance(&a), 1.0);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{BitVector, ImageHash};
use crate::error::{Error, Result};

/// Aggregate of one or more hashes produced by the same algorithm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FuzzyHash {
    /// Per-bit count of merged hashes with that bit set.
    ones: Vec<u32>,
    /// Number of merged hashes.
    merged: u32,
    algorithm_id: u32,
}

impl FuzzyHash {
    /// Start a fuzzy hash from a single crisp hash.
    pub fn from_hash(hash: &ImageHash) -> Self {
        let ones = (0..hash.len()).map(|i| u32::from(hash.bit(i))).collect();
        Self {
            ones,
            merged: 1,
            algorithm_id: hash.algorithm_id(),
        }
    }

    /// Merge every hash yielded by `hashes`.
    ///
    /// Fails on an empty iterator or on incompatible hashes.
    pub fn from_hashes<'a, I>(hashes: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a ImageHash>,
    {
        let mut iter = hashes.into_iter();
        let first = iter.next().ok_or_else(|| {
            Error::InvalidParameter("cannot build a fuzzy hash from zero hashes".to_string())
        })?;
        let mut fuzzy = Self::from_hash(first);
        for hash in iter {
            fuzzy.merge(hash)?;
        }
        Ok(fuzzy)
    }

    /// Fold another crisp hash into this one.
    pub fn merge(&mut self, hash: &ImageHash) -> Result<()> {
        self.check_compatible(hash.algorithm_id(), hash.len())?;
        for (i, count) in self.ones.iter_mut().enumerate() {
            *count += u32::from(hash.bit(i));
        }
        self.merged += 1;
        Ok(())
    }

    /// Fold another fuzzy hash into this one.
    pub fn merge_fuzzy(&mut self, other: &FuzzyHash) -> Result<()> {
        self.check_compatible(other.algorithm_id, other.len())?;
        for (count, other_count) in self.ones.iter_mut().zip(&other.ones) {
            *count += other_count;
        }
        self.merged += other.merged;
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ones.is_empty()
    }

    #[inline]
    pub fn algorithm_id(&self) -> u32 {
        self.algorithm_id
    }

    /// Number of crisp hashes merged so far.
    pub fn merged_count(&self) -> u32 {
        self.merged
    }

    /// Fraction of merged hashes with bit `index` set.
    #[inline]
    pub fn probability(&self, index: usize) -> f64 {
        f64::from(self.ones[index]) / f64::from(self.merged)
    }

    /// Majority vote for bit `index`; an even split counts as set.
    #[inline]
    pub fn consensus_bit(&self, index: usize) -> bool {
        self.probability(index) >= 0.5
    }

    /// How strongly the merged hashes agree on bit `index`, in `[0, 1]`.
    pub fn certainty(&self, index: usize) -> f64 {
        (self.probability(index) - 0.5).abs() * 2.0
    }

    /// Cost of a needle having `bit` at position `index`.
    #[inline]
    pub fn bit_distance(&self, index: usize, bit: bool) -> f64 {
        let p = self.probability(index);
        if bit {
            1.0 - p
        } else {
            p
        }
    }

    /// Crisp hash made of the consensus bits.
    pub fn consensus(&self) -> ImageHash {
        let mut bits = BitVector::zeros(self.len());
        for i in 0..self.len() {
            if self.consensus_bit(i) {
                bits.set(i, true);
            }
        }
        ImageHash::from_bits(bits, self.algorithm_id)
    }

    /// Sum of per-bit costs against `hash`, in `[0, len]`.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn weighted_distance(&self, hash: &ImageHash) -> f64 {
        assert_eq!(self.len(), hash.len(), "hash length mismatch");
        (0..self.len())
            .map(|i| self.bit_distance(i, hash.bit(i)))
            .sum()
    }

    /// Weighted distance divided by the hash length, in `[0, 1]`.
    pub fn normalized_weighted_distance(&self, hash: &ImageHash) -> f64 {
        self.weighted_distance(hash) / self.len() as f64
    }

    /// Weighted distance after checking that `hash` is comparable.
    pub fn try_weighted_distance(&self, hash: &ImageHash) -> Result<f64> {
        self.check_compatible(hash.algorithm_id(), hash.len())?;
        Ok(self.weighted_distance(hash))
    }

    fn check_compatible(&self, algorithm_id: u32, len: usize) -> Result<()> {
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

impl From<&ImageHash> for FuzzyHash {
    fn from(hash: &ImageHash) -> Self {
        Self::from_hash(hash)
    }
}
