//! Block-median hashes.
//!
//! The image is cut into a grid of square blocks; each block is summarized by
//! the median luma of its pixels, and each block emits `1` when its median is
//! below the median of all block medians. Medians ignore the few outlier
//! pixels that compression artifacts and watermarks introduce, which makes
//! these hashes sturdier than [`AverageHash`](super::AverageHash) at similar
//! cost.

use image::DynamicImage;

use super::{
    checked_side, derive_algorithm_id, luma, luma_grid, note_resolution, HashingAlgorithm,
};
use crate::error::{Error, Result};
use crate::hash::{HashBuilder, ImageHash};

/// Pixels per block side after resizing.
pub const DEFAULT_BLOCK_WIDTH: u32 = 4;

/// Block grid chosen for a requested resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockGrid {
    x_blocks: u32,
    y_blocks: u32,
    block_width: u32,
}

impl BlockGrid {
    /// Pick `x_blocks × y_blocks` closest to `bit_resolution`, allowing at most
    /// one block of asymmetry.
    fn for_resolution(bit_resolution: usize, block_width: u32, name: &str) -> Result<Self> {
        if block_width == 0 {
            return Err(Error::InvalidParameter(format!(
                "{name}: block width must be at least 1"
            )));
        }
        let d = (bit_resolution as f64).sqrt().floor() as u64;
        if d < 2 {
            return Err(Error::InvalidParameter(format!(
                "{name} needs at least a 2x2 block grid, got resolution {bit_resolution}"
            )));
        }
        let target = bit_resolution as i128;
        let (x, y) = [(d, d), (d + 1, d), (d + 1, d + 1)]
            .into_iter()
            .min_by_key(|&(x, y)| (i128::from(x) * i128::from(y) - target).abs())
            .unwrap_or((d, d));
        let too_large = || {
            Error::InvalidParameter(format!("{name}: resolution {bit_resolution} is too large"))
        };
        let x_blocks = u32::try_from(x).map_err(|_| too_large())?;
        let y_blocks = u32::try_from(y).map_err(|_| too_large())?;

        // Thumbnail sides and the overlapping window must fit a u32.
        checked_side(name, x_blocks, block_width)?;
        checked_side(name, y_blocks, block_width)?;
        let window = checked_side(name, block_width, 3)?
            .checked_add(1)
            .ok_or_else(too_large)?
            / 2;
        checked_side(name, window, window)?;
        Ok(Self {
            x_blocks,
            y_blocks,
            block_width,
        })
    }

    fn block_count(&self) -> usize {
        self.x_blocks as usize * self.y_blocks as usize
    }

    fn id_params(&self) -> [u64; 3] {
        [
            u64::from(self.x_blocks),
            u64::from(self.y_blocks),
            u64::from(self.block_width),
        ]
    }

    /// Block medians in row-major order.
    fn block_medians(&self, image: &DynamicImage, overlapping: bool) -> Vec<f64> {
        let bw = self.block_width;
        let grid = luma_grid(image, self.x_blocks * bw, self.y_blocks * bw);

        // Overlapping windows are 1.5x the block, centered on it.
        let window = if overlapping { (bw * 3 + 1) / 2 } else { bw };
        let margin = i64::from((window - bw) / 2);

        let mut samples = Vec::with_capacity(window as usize * window as usize);
        let mut medians = Vec::with_capacity(self.block_count());
        for by in 0..self.y_blocks {
            for bx in 0..self.x_blocks {
                let x0 = i64::from(bx * bw) - margin;
                let y0 = i64::from(by * bw) - margin;
                samples.clear();
                for dy in 0..i64::from(window) {
                    let y = reflect(y0 + dy, grid.height());
                    for dx in 0..i64::from(window) {
                        let x = reflect(x0 + dx, grid.width());
                        samples.push(f64::from(luma(&grid, x, y)));
                    }
                }
                medians.push(median(&mut samples));
            }
        }
        medians
    }

    fn hash(&self, image: &DynamicImage, overlapping: bool, algorithm_id: u32) -> ImageHash {
        let medians = self.block_medians(image, overlapping);
        let global = median(&mut medians.clone());

        let mut builder = HashBuilder::new(self.block_count());
        for m in medians {
            builder.prepend(m < global);
        }
        builder.into_hash(algorithm_id)
    }
}

/// Mirror an out-of-range coordinate back into `[0, len)`.
fn reflect(coord: i64, len: u32) -> u32 {
    let len = i64::from(len);
    let mirrored = if coord < 0 {
        -coord - 1
    } else if coord >= len {
        2 * len - coord - 1
    } else {
        coord
    };
    mirrored.clamp(0, len - 1) as u32
}

fn median(values: &mut [f64]) -> f64 {
    debug_assert!(!values.is_empty());
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// One bit per block: block median below the median of medians.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedianBlockHash {
    grid: BlockGrid,
    algorithm_id: u32,
}

impl MedianBlockHash {
    pub fn new(bit_resolution: usize) -> Result<Self> {
        Self::with_block_width(bit_resolution, DEFAULT_BLOCK_WIDTH)
    }

    pub fn with_block_width(bit_resolution: usize, block_width: u32) -> Result<Self> {
        let grid = BlockGrid::for_resolution(bit_resolution, block_width, "MedianBlockHash")?;
        note_resolution("MedianBlockHash", bit_resolution, grid.block_count());
        Ok(Self {
            algorithm_id: derive_algorithm_id("MedianBlockHash", &grid.id_params()),
            grid,
        })
    }

    /// `(x_blocks, y_blocks)`.
    pub fn blocks(&self) -> (u32, u32) {
        (self.grid.x_blocks, self.grid.y_blocks)
    }
}

impl HashingAlgorithm for MedianBlockHash {
    fn hash(&self, image: &DynamicImage) -> ImageHash {
        self.grid.hash(image, false, self.algorithm_id)
    }

    fn algorithm_id(&self) -> u32 {
        self.algorithm_id
    }

    fn key_resolution(&self) -> usize {
        self.grid.block_count()
    }
}

/// [`MedianBlockHash`] whose sampling windows overlap their neighbors.
///
/// Each block reads a window 1.5x its size; coordinates falling off the image
/// are mirrored back inside instead of being clamped or skipped, so border
/// blocks see as many samples as interior ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlappingMedianHash {
    grid: BlockGrid,
    algorithm_id: u32,
}

impl OverlappingMedianHash {
    pub fn new(bit_resolution: usize) -> Result<Self> {
        Self::with_block_width(bit_resolution, DEFAULT_BLOCK_WIDTH)
    }

    pub fn with_block_width(bit_resolution: usize, block_width: u32) -> Result<Self> {
        let grid =
            BlockGrid::for_resolution(bit_resolution, block_width, "OverlappingMedianHash")?;
        note_resolution("OverlappingMedianHash", bit_resolution, grid.block_count());
        Ok(Self {
            algorithm_id: derive_algorithm_id("OverlappingMedianHash", &grid.id_params()),
            grid,
        })
    }

    pub fn blocks(&self) -> (u32, u32) {
        (self.grid.x_blocks, self.grid.y_blocks)
    }
}

impl HashingAlgorithm for OverlappingMedianHash {
    fn hash(&self, image: &DynamicImage) -> ImageHash {
        self.grid.hash(image, true, self.algorithm_id)
    }

    fn algorithm_id(&self) -> u32 {
        self.algorithm_id
    }

    fn key_resolution(&self) -> usize {
        self.grid.block_count()
    }
}
