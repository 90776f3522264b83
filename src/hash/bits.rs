//! Fixed-capacity bit storage.
//!
//! Bits live in little-endian `u64` words: bit `i` is bit `i % 64` of word
//! `i / 64`. Bits past `len` in the last word are always zero, so equality,
//! hashing and popcounts never see stale data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const WORD_BITS: usize = 64;

/// A bit vector whose length is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BitVector {
    words: Vec<u64>,
    len: usize,
}

impl BitVector {
    /// All-zero vector of `len` bits.
    pub fn zeros(len: usize) -> Self {
        Self {
            words: vec![0; words_for(len)],
            len,
        }
    }

    /// Build from raw words (least significant word first).
    ///
    /// Missing words are treated as zero, surplus words and bits beyond `len`
    /// are dropped.
    pub fn from_words(mut words: Vec<u64>, len: usize) -> Self {
        words.resize(words_for(len), 0);
        let mut bits = Self { words, len };
        bits.clear_tail();
        bits
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        assert!(
            index < self.len,
            "bit index {index} out of range for {} bits",
            self.len
        );
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    /// Set bit `index` to `bit`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[inline]
    pub fn set(&mut self, index: usize, bit: bool) {
        assert!(
            index < self.len,
            "bit index {index} out of range for {} bits",
            self.len
        );
        let mask = 1u64 << (index % WORD_BITS);
        if bit {
            self.words[index / WORD_BITS] |= mask;
        } else {
            self.words[index / WORD_BITS] &= !mask;
        }
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Hamming distance (popcount of XOR) over the shorter of the two vectors.
    ///
    /// Callers are expected to check lengths first.
    #[inline]
    pub fn hamming_distance(&self, other: &BitVector) -> usize {
        debug_assert_eq!(self.len, other.len);
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum()
    }

    /// Underlying words, least significant first.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    fn clear_tail(&mut self) {
        let used = self.len % WORD_BITS;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

#[inline]
fn words_for(len: usize) -> usize {
    (len + WORD_BITS - 1) / WORD_BITS
}
