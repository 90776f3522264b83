//! Perceptive hash: thresholded low-frequency DCT coefficients.
//!
//! The thumbnail is transformed with a 2-D DCT-II and only the top-left
//! `d × d` block of coefficients (the lowest frequencies) is kept. Low
//! frequencies describe the coarse structure of an image and survive
//! rescaling, gamma changes and recompression far better than raw pixels.
//!
//! # References
//!
//! - Zauner (2010). "Implementation and Benchmarking of Perceptual Image Hash Functions"

use std::f64::consts::PI;

use image::DynamicImage;

use super::{
    checked_side, derive_algorithm_id, luma, luma_grid, note_resolution, HashingAlgorithm,
};
use crate::error::{Error, Result};
use crate::hash::{HashBuilder, ImageHash};

/// Oversampling of the thumbnail relative to the kept coefficient block.
const OVERSAMPLE: u32 = 4;

/// DCT-based perceptual hash.
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptiveHash {
    dimension: u32,
    /// `cos_table[k * size + n]` = `c(k) * cos((2n + 1) k π / 2 size)`, for `k < dimension`.
    cos_table: Vec<f64>,
    algorithm_id: u32,
}

impl PerceptiveHash {
    /// `bit_resolution` is rounded up to the next square number `d²`.
    pub fn new(bit_resolution: usize) -> Result<Self> {
        let dimension = (bit_resolution as f64).sqrt().ceil() as u32;
        if dimension < 2 {
            return Err(Error::InvalidParameter(format!(
                "perceptive hash needs at least 2x2 coefficients, got resolution {bit_resolution}"
            )));
        }
        let size = checked_side("PerceptiveHash", dimension, OVERSAMPLE)?;
        checked_side("PerceptiveHash", dimension, size)?;
        let hasher = Self {
            dimension,
            cos_table: cos_table(dimension, size),
            algorithm_id: derive_algorithm_id("PerceptiveHash", &[u64::from(dimension)]),
        };
        note_resolution("PerceptiveHash", bit_resolution, hasher.key_resolution());
        Ok(hasher)
    }

    /// Low-frequency coefficients, `coefficients[v * d + u]` for horizontal
    /// frequency `u` and vertical frequency `v`.
    fn coefficients(&self, image: &DynamicImage) -> Vec<f64> {
        let d = self.dimension as usize;
        let size = (self.dimension * OVERSAMPLE) as usize;
        let grid = luma_grid(image, size as u32, size as u32);

        // Separable transform: columns first, only for the kept frequencies.
        let mut partial = vec![0.0f64; d * size];
        for v in 0..d {
            let basis = &self.cos_table[v * size..(v + 1) * size];
            for x in 0..size {
                partial[v * size + x] = (0..size)
                    .map(|y| basis[y] * f64::from(luma(&grid, x as u32, y as u32)))
                    .sum();
            }
        }

        let mut coefficients = vec![0.0f64; d * d];
        for v in 0..d {
            let row = &partial[v * size..(v + 1) * size];
            for u in 0..d {
                let basis = &self.cos_table[u * size..(u + 1) * size];
                coefficients[v * d + u] = row.iter().zip(basis).map(|(a, b)| a * b).sum();
            }
        }
        coefficients
    }
}

fn cos_table(dimension: u32, size: u32) -> Vec<f64> {
    let size_f = f64::from(size);
    let mut table = Vec::with_capacity(dimension as usize * size as usize);
    for k in 0..dimension {
        let scale = if k == 0 {
            (1.0 / size_f).sqrt()
        } else {
            (2.0 / size_f).sqrt()
        };
        for n in 0..size {
            let angle = (2.0 * f64::from(n) + 1.0) * f64::from(k) * PI / (2.0 * size_f);
            table.push(scale * angle.cos());
        }
    }
    table
}

impl HashingAlgorithm for PerceptiveHash {
    fn hash(&self, image: &DynamicImage) -> ImageHash {
        let coefficients = self.coefficients(image);

        // The DC term only encodes overall brightness and would dominate the mean.
        let ac = &coefficients[1..];
        let mean = ac.iter().sum::<f64>() / ac.len() as f64;

        let mut builder = HashBuilder::new(self.key_resolution());
        for &c in &coefficients {
            builder.prepend(c > mean);
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
