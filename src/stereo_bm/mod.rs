//! # Block matching disparity computation
//!
//! This module provides a sum-of-absolute-differences block matching stereo algorithm with
//! pre-filtering, a texture check, a uniqueness check and speckle post-filtering.
//!
//! Disparities are written in fixed point, see [`DISP_SCALE`](crate::DISP_SCALE).

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod matching;
mod params;
mod prefilter;
mod speckle;

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::time::Instant;

use image::GrayImage;
use rayon::prelude::*;

use crate::disparity::{DisparityAlgorithm, DisparityMap, DISP_SCALE};
use crate::error::*;
use crate::frame::StereoPair;

use matching::MatchContext;

pub use params::{PreFilterType, StereoParams, MAX_NUM_DISPARITIES};
pub use speckle::SpeckleFilter;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Bands handed to each worker thread, more than one so uneven rows balance out.
const BANDS_PER_THREAD: usize = 4;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Block matching stereo engine.
pub struct StereoBM {
    params: StereoParams,
    speckle: SpeckleFilter
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl StereoBM {
    /// Create a new instance of the algorithm, validating the given parameters.
    pub fn new(params: StereoParams) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            params,
            speckle: SpeckleFilter::new()
        })
    }

    pub fn params(&self) -> &StereoParams {
        &self.params
    }

    /// Check that the pair is large enough for at least one full block at every disparity.
    fn check_input(&self, pair: &StereoPair) -> Result<()> {
        let (width, height) = (pair.width(), pair.height());
        let min_width = self.params.block_size + self.params.num_disparities;

        if width < min_width {
            return Err(Error::InvalidInput(format!(
                "image width {} is less than block_size + num_disparities ({})",
                width, min_width
            )));
        }

        if height < self.params.block_size {
            return Err(Error::InvalidInput(format!(
                "image height {} is less than block_size ({})",
                height, self.params.block_size
            )));
        }

        Ok(())
    }
}

impl DisparityAlgorithm for StereoBM {
    /// Compute the disparity map for the given pair.
    fn compute(&mut self, pair: &StereoPair) -> Result<DisparityMap> {
        self.check_input(pair)?;

        let start = Instant::now();
        let (width, height) = (pair.width(), pair.height());

        log::debug!("Computing {}x{} disparity with {:?}", width, height, self.params);

        // ---- PRE FILTER ----

        let params = &self.params;
        let (left, right) = rayon::join(
            || prefilter::pre_filter(pair.left(), params),
            || prefilter::pre_filter(pair.right(), params)
        );

        // ---- STEREO CORRELATION ----

        let mut disp_map = DisparityMap::new(width, height);

        let ctx = MatchContext {
            left: &left,
            right: &right,
            width,
            height,
            params
        };

        let bands = rayon::current_num_threads() * BANDS_PER_THREAD;
        let band_rows = ((height + bands - 1) / bands).max(params.block_size);

        disp_map
            .as_raw_mut()
            .par_chunks_mut(width * band_rows)
            .enumerate()
            .for_each(|(i, band)| matching::match_band(&ctx, i * band_rows, band));

        // ---- POST FILTER ----

        if params.speckle_window_size > 0 {
            let removed = self.speckle.apply(
                &mut disp_map,
                params.speckle_window_size,
                params.speckle_range as i32 * DISP_SCALE
            );
            log::debug!("Speckle filter removed {} pixels", removed);
        }

        log::debug!(
            "Disparity computed in {:?}, {} valid pixels",
            start.elapsed(),
            disp_map.valid_count()
        );

        Ok(disp_map)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Compute the disparity map of a rectified grayscale pair in one call.
///
/// The images are moved into the pair, so callers that still need them should clone.
pub fn compute_disparity(
    left: GrayImage,
    right: GrayImage,
    params: StereoParams
) -> Result<DisparityMap> {
    let pair = StereoPair::new(left, right)?;
    StereoBM::new(params)?.compute(&pair)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_params_are_rejected_at_construction() {
        let params = StereoParams {
            block_size: 6,
            ..StereoParams::default()
        };
        assert!(matches!(StereoBM::new(params), Err(Error::InvalidParams(_))));
    }

    #[test]
    fn narrow_images_are_rejected() {
        let mut bm = StereoBM::new(StereoParams::default()).unwrap();
        let pair = StereoPair::new(GrayImage::new(78, 40), GrayImage::new(78, 40)).unwrap();
        assert!(matches!(bm.compute(&pair), Err(Error::InvalidInput(_))));

        let pair = StereoPair::new(GrayImage::new(79, 40), GrayImage::new(79, 40)).unwrap();
        assert!(bm.compute(&pair).is_ok());
    }

    #[test]
    fn short_images_are_rejected() {
        let mut bm = StereoBM::new(StereoParams::default()).unwrap();
        let pair = StereoPair::new(GrayImage::new(100, 14), GrayImage::new(100, 14)).unwrap();
        assert!(matches!(bm.compute(&pair), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn mismatched_images_are_rejected() {
        let res = compute_disparity(
            GrayImage::new(100, 40),
            GrayImage::new(100, 41),
            StereoParams::default()
        );
        assert!(matches!(res, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn largest_speckle_range_does_not_overflow() {
        let img = GrayImage::from_fn(100, 40, |x, y| {
            image::Luma([((x * 37 + y * 91) % 251) as u8])
        });
        let params = StereoParams {
            speckle_window_size: 10,
            speckle_range: MAX_NUM_DISPARITIES as u32,
            ..StereoParams::default()
        };

        assert!(compute_disparity(img.clone(), img, params).is_ok());
    }
}
