//! Difference hash: direction of the local brightness gradient.

use image::{DynamicImage, GrayImage};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    checked_side, derive_algorithm_id, luma, luma_grid, note_resolution, HashingAlgorithm,
};
use crate::error::{Error, Result};
use crate::hash::{HashBuilder, ImageHash};

/// Which gradient passes a [`DifferenceHash`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Precision {
    /// Left-to-right gradient only.
    #[default]
    Simple,
    /// Adds a top-to-bottom pass; doubles the hash length.
    Double,
    /// Adds an upper-left diagonal pass on top of `Double`; triples the length.
    Triple,
}

impl Precision {
    fn passes(self) -> usize {
        match self {
            Precision::Simple => 1,
            Precision::Double => 2,
            Precision::Triple => 3,
        }
    }
}

/// Emits `1` where a sample is at least as bright as its neighbor.
///
/// Each pass samples a grid padded by one row or column so every compared
/// sample has a neighbor inside the same row (or column): the padding is read
/// but never compared against the far end of the previous row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferenceHash {
    /// `x` with `x * (x + 1)` bits per pass.
    samples: u32,
    precision: Precision,
    algorithm_id: u32,
}

impl DifferenceHash {
    pub fn new(bit_resolution: usize, precision: Precision) -> Result<Self> {
        // positive root of x^2 + x - r = 0
        let samples = (((1.0 + 4.0 * bit_resolution as f64).sqrt() - 1.0) / 2.0).round() as u32;
        if samples < 1 {
            return Err(Error::InvalidParameter(format!(
                "difference hash needs at least one comparison per pass, got resolution {bit_resolution}"
            )));
        }
        // diagonal pass reads (x + 1) x (x + 2)
        let padded = samples.checked_add(2).ok_or_else(|| {
            Error::InvalidParameter(format!(
                "difference hash resolution {bit_resolution} is too large"
            ))
        })?;
        checked_side("DifferenceHash", samples + 1, padded)?;
        let hasher = Self {
            samples,
            precision,
            algorithm_id: derive_algorithm_id(
                "DifferenceHash",
                &[u64::from(samples), precision.passes() as u64],
            ),
        };
        note_resolution(
            "DifferenceHash",
            bit_resolution * precision.passes(),
            hasher.key_resolution(),
        );
        Ok(hasher)
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    fn bits_per_pass(&self) -> usize {
        self.samples as usize * (self.samples as usize + 1)
    }
}

impl HashingAlgorithm for DifferenceHash {
    fn hash(&self, image: &DynamicImage) -> ImageHash {
        let n = self.samples;
        let mut builder = HashBuilder::new(self.key_resolution());

        let grid = luma_grid(image, n + 1, n + 1);
        horizontal_pass(&grid, &mut builder);

        if matches!(self.precision, Precision::Double | Precision::Triple) {
            vertical_pass(&grid, &mut builder);
        }

        if self.precision == Precision::Triple {
            let grid = luma_grid(image, n + 1, n + 2);
            diagonal_pass(&grid, &mut builder);
        }

        builder.into_hash(self.algorithm_id)
    }

    fn algorithm_id(&self) -> u32 {
        self.algorithm_id
    }

    fn key_resolution(&self) -> usize {
        self.bits_per_pass() * self.precision.passes()
    }
}

fn horizontal_pass(grid: &GrayImage, builder: &mut HashBuilder) {
    for y in 0..grid.height() {
        for x in 1..grid.width() {
            builder.prepend(luma(grid, x, y) >= luma(grid, x - 1, y));
        }
    }
}

fn vertical_pass(grid: &GrayImage, builder: &mut HashBuilder) {
    for x in 0..grid.width() {
        for y in 1..grid.height() {
            builder.prepend(luma(grid, x, y) >= luma(grid, x, y - 1));
        }
    }
}

fn diagonal_pass(grid: &GrayImage, builder: &mut HashBuilder) {
    for y in 1..grid.height() {
        for x in 1..grid.width() {
            builder.prepend(luma(grid, x, y) >= luma(grid, x - 1, y - 1));
        }
    }
}
