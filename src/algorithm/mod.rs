//! Feature extraction: images to perceptual hashes.
//!
//! Every algorithm follows the same pipeline: shrink the image to a tiny
//! gray-scale grid, derive one scalar per sample point, threshold it against
//! a reference statistic, emit one bit per sample. They differ in the scalar
//! and the statistic, and therefore in cost and discriminative power:
//!
//! | Algorithm | Scalar | Threshold | Bits for `r` |
//! |-----------|--------|-----------|--------------|
//! | [`AverageHash`] | brightness | mean brightness | `round(√r)²` |
//! | [`DifferenceHash`] | gradient sign | left / upper / diagonal neighbor | `x(x+1)` per pass |
//! | [`MedianBlockHash`] | block median | median of block medians | `≈ r` |
//! | [`OverlappingMedianHash`] | overlapping block median | median of block medians | `≈ r` |
//! | [`PerceptiveHash`] | DCT coefficient | mean coefficient | `ceil(√r)²` |
//!
//! ## Resolution
//!
//! The requested bit resolution is a target, not a promise: the grid has to
//! be made of whole samples. [`HashingAlgorithm::key_resolution`] reports the
//! length actually produced.
//!
//! ## Identity
//!
//! [`HashingAlgorithm::algorithm_id`] is derived from the algorithm name and
//! its effective parameters. Two instances that would produce comparable
//! hashes share an id; anything else does not. Indexes use the id to refuse
//! mixing hashes of different algorithms.
//!
//! ```rust
//! use glimpse::algorithm::{AverageHash, HashingAlgorithm};
//! use image::{DynamicImage, GrayImage, Luma};
//!
//! let img = DynamicImage::ImageLuma8(GrayImage::from_fn(32, 32, |x, y| Luma([(x * 7 + y) as u8])));
//! let ahash = AverageHash::new(64).unwrap();
//!
//! let h = ahash.hash(&img);
//! assert_eq!(h.len(), 64);
//! assert_eq!(h, ahash.hash(&img));
//! ```

mod average;
mod difference;
mod median;
mod perceptive;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};

use crate::error::{Error, Result};
use crate::hash::ImageHash;

pub use average::AverageHash;
pub use difference::{DifferenceHash, Precision};
pub use median::{MedianBlockHash, OverlappingMedianHash, DEFAULT_BLOCK_WIDTH};
pub use perceptive::PerceptiveHash;

/// Bumped whenever any algorithm changes the bits it emits.
const ENCODING_VERSION: u32 = 1;

/// Capability shared by all feature-extraction algorithms.
pub trait HashingAlgorithm: Send + Sync {
    /// Hash an image. Deterministic: equal pixels give equal hashes.
    fn hash(&self, image: &DynamicImage) -> ImageHash;

    /// Identity stamped on every hash this instance produces.
    fn algorithm_id(&self) -> u32;

    /// Number of bits actually emitted per hash.
    fn key_resolution(&self) -> usize;
}

/// Hash a batch of images on the rayon thread pool.
#[cfg(feature = "parallel")]
pub fn hash_all<A>(algorithm: &A, images: &[DynamicImage]) -> Vec<ImageHash>
where
    A: HashingAlgorithm + ?Sized,
{
    use rayon::prelude::*;

    images.par_iter().map(|image| algorithm.hash(image)).collect()
}

pub(crate) fn derive_algorithm_id(name: &str, params: &[u64]) -> u32 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    params.hash(&mut hasher);
    ENCODING_VERSION.hash(&mut hasher);
    let h = hasher.finish();
    (h ^ (h >> 32)) as u32
}

/// Resize to exactly `width × height` and convert to 8-bit luma.
pub(crate) fn luma_grid(image: &DynamicImage, width: u32, height: u32) -> GrayImage {
    image
        .resize_exact(width, height, FilterType::Triangle)
        .into_luma8()
}

#[inline]
pub(crate) fn luma(grid: &GrayImage, x: u32, y: u32) -> u8 {
    grid.get_pixel(x, y).0[0]
}

/// `a * b` as a pixel count along one side; fails if it does not fit a `u32`.
pub(crate) fn checked_side(algorithm: &str, a: u32, b: u32) -> Result<u32> {
    a.checked_mul(b).ok_or_else(|| {
        Error::InvalidParameter(format!(
            "{algorithm}: {a} x {b} pixels overflows the thumbnail size"
        ))
    })
}

pub(crate) fn note_resolution(algorithm: &'static str, requested: usize, actual: usize) {
    if requested != actual {
        tracing::debug!(
            algorithm,
            requested,
            actual,
            "bit resolution not exactly achievable, using nearest grid"
        );
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_side_rejects_overflow() {
        assert_eq!(checked_side("test", 8, 4), Ok(32));
        assert!(matches!(
            checked_side("test", 1 << 16, 1 << 16),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn ids_depend_on_name_and_params() {
        let a = derive_algorithm_id("AverageHash", &[8]);
        assert_eq!(a, derive_algorithm_id("AverageHash", &[8]));
        assert_ne!(a, derive_algorithm_id("AverageHash", &[9]));
        assert_ne!(a, derive_algorithm_id("PerceptiveHash", &[8]));
    }

    #[test]
    fn algorithms_are_distinct_and_usable_as_trait_objects() {
        let algorithms: Vec<Box<dyn HashingAlgorithm>> = vec![
            Box::new(AverageHash::new(64).unwrap()),
            Box::new(DifferenceHash::new(64, Precision::Simple).unwrap()),
            Box::new(DifferenceHash::new(64, Precision::Double).unwrap()),
            Box::new(MedianBlockHash::new(64).unwrap()),
            Box::new(OverlappingMedianHash::new(64).unwrap()),
            Box::new(PerceptiveHash::new(64).unwrap()),
        ];
        let img = test_images::gradient(64, 48);

        let mut ids: Vec<u32> = algorithms.iter().map(|a| a.algorithm_id()).collect();
        for algorithm in &algorithms {
            let h = algorithm.hash(&img);
            assert_eq!(h.len(), algorithm.key_resolution());
            assert_eq!(h.algorithm_id(), algorithm.algorithm_id());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), algorithms.len());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn hash_all_matches_sequential() {
        let algorithm = DifferenceHash::new(32, Precision::Triple).unwrap();
        let images: Vec<_> = (0..8).map(|i| test_images::noise(40, 30, i)).collect();
        let parallel = hash_all(&algorithm, &images);
        let sequential: Vec<_> = images.iter().map(|i| algorithm.hash(i)).collect();
        assert_eq!(parallel, sequential);
    }
}
