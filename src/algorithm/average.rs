//! Average hash: brightness above or below the mean.

use image::DynamicImage;

use super::{checked_side, derive_algorithm_id, luma_grid, note_resolution, HashingAlgorithm};
use crate::error::{Error, Result};
use crate::hash::{HashBuilder, ImageHash};

/// Thresholds every sample of a `d × d` gray-scale thumbnail against the
/// thumbnail's mean brightness.
///
/// Cheapest of the algorithms and robust to scaling and mild compression;
/// sensitive to global brightness shifts that move pixels across the mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AverageHash {
    dimension: u32,
    algorithm_id: u32,
}

impl AverageHash {
    /// `bit_resolution` is rounded to the nearest square number `d²`.
    pub fn new(bit_resolution: usize) -> Result<Self> {
        let dimension = (bit_resolution as f64).sqrt().round() as u32;
        if dimension < 2 {
            return Err(Error::InvalidParameter(format!(
                "average hash needs at least a 2x2 grid, got resolution {bit_resolution}"
            )));
        }
        checked_side("AverageHash", dimension, dimension)?;
        let hasher = Self {
            dimension,
            algorithm_id: derive_algorithm_id("AverageHash", &[u64::from(dimension)]),
        };
        note_resolution("AverageHash", bit_resolution, hasher.key_resolution());
        Ok(hasher)
    }

    /// Side length of the sampling grid.
    pub fn dimension(&self) -> u32 {
        self.dimension
    }
}

impl HashingAlgorithm for AverageHash {
    fn hash(&self, image: &DynamicImage) -> ImageHash {
        let d = self.dimension;
        let grid = luma_grid(image, d, d);
        let samples = u64::from(d) * u64::from(d);
        let sum: u64 = grid.pixels().map(|p| u64::from(p.0[0])).sum();

        // sample >= sum / samples, kept in integers
        let mut builder = HashBuilder::new(self.key_resolution());
        for p in grid.pixels() {
            builder.prepend(u64::from(p.0[0]) * samples >= sum);
        }
        builder.into_hash(self.algorithm_id)
    }

    fn algorithm_id(&self) -> u32 {
        self.algorithm_id
    }

    fn key_resolution(&self) -> usize {
        self.dimension as usize * self.dimension as usize
    }
}
