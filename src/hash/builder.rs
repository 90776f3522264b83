//! Incremental hash assembly.

use super::bits::BitVector;
use super::ImageHash;

/// Accumulates bits into a hash of a declared length.
///
/// Every prepended bit becomes more significant than all bits prepended before
/// it: the first bit lands at index 0, the last at index `len - 1`. Algorithms
/// can therefore emit bits in natural scan order without computing positions.
#[derive(Debug, Clone)]
pub struct HashBuilder {
    bits: BitVector,
    written: usize,
}

impl HashBuilder {
    /// Builder for a hash of exactly `len` bits.
    ///
    /// # Panics
    ///
    /// Panics if `len == 0`.
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "hash length must be at least one bit");
        Self {
            bits: BitVector::zeros(len),
            written: 0,
        }
    }

    #[inline]
    pub fn prepend_one(&mut self) {
        self.prepend(true);
    }

    #[inline]
    pub fn prepend_zero(&mut self) {
        self.prepend(false);
    }

    /// Prepend `bit`.
    ///
    /// # Panics
    ///
    /// Panics when more bits are written than declared.
    #[inline]
    pub fn prepend(&mut self, bit: bool) {
        assert!(
            self.written < self.bits.len(),
            "hash builder overflow: declared {} bits",
            self.bits.len()
        );
        if bit {
            self.bits.set(self.written, true);
        }
        self.written += 1;
    }

    /// Number of bits written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Finalize into an [`ImageHash`].
    ///
    /// # Panics
    ///
    /// Panics unless exactly the declared number of bits was written.
    pub fn into_hash(self, algorithm_id: u32) -> ImageHash {
        assert_eq!(
            self.written,
            self.bits.len(),
            "hash builder underflow: wrote {} of {} bits",
            self.written,
            self.bits.len()
        );
        ImageHash::from_bits(self.bits, algorithm_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_bits_are_more_significant() {
        let mut builder = HashBuilder::new(4);
        builder.prepend_one();
        builder.prepend_zero();
        builder.prepend_zero();
        builder.prepend_one();
        let hash = builder.into_hash(7);

        assert_eq!(hash.to_binary_string(), "1001");
        assert!(hash.bit(0));
        assert!(hash.bit(3));
        assert_eq!(hash.algorithm_id(), 7);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn too_few_bits_panics() {
        let mut builder = HashBuilder::new(3);
        builder.prepend_one();
        builder.into_hash(0);
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn too_many_bits_panics() {
        let mut builder = HashBuilder::new(1);
        builder.prepend_one();
        builder.prepend_one();
    }
}
