//! # General disparity objects
//!
//! This module provides generic disparity traits and structures for use by different algorithms.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{GrayImage, RgbImage};

use crate::error::*;
use crate::frame::StereoPair;
use crate::visualise;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Number of fractional bits in a fixed-point disparity value.
pub const DISP_SHIFT: u32 = 4;

/// Scale between a disparity in pixels and its fixed-point representation.
pub const DISP_SCALE: i32 = 1 << DISP_SHIFT;

/// Sentinel stored for pixels with no trusted disparity.
pub const INVALID_DISPARITY: i16 = i16::MIN;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A fixed-point disparity map.
///
/// Every value is the disparity in pixels multiplied by [`DISP_SCALE`], or
/// [`INVALID_DISPARITY`] where no disparity could be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisparityMap {
    data: Vec<i16>,
    width: usize,
    height: usize
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Compute the disparity map of the given stereo pair.
    fn compute(&mut self, pair: &StereoPair) -> Result<DisparityMap>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DisparityMap {
    /// Create a new map with every pixel marked invalid.
    pub fn new(width: usize, height: usize) -> Self {
        DisparityMap {
            data: vec![INVALID_DISPARITY; width * height],
            width,
            height
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw fixed-point value at the given position.
    pub fn get_raw(&self, x: usize, y: usize) -> i16 {
        self.data[y * self.width + x]
    }

    pub fn put_raw(&mut self, x: usize, y: usize, val: i16) {
        self.data[y * self.width + x] = val;
    }

    /// Disparity in pixels at the given position, or `None` if the pixel is invalid.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        match self.get_raw(x, y) {
            INVALID_DISPARITY => None,
            raw => Some(raw as f32 / DISP_SCALE as f32)
        }
    }

    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        self.get_raw(x, y) != INVALID_DISPARITY
    }

    /// Number of pixels holding a valid disparity.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != INVALID_DISPARITY).count()
    }

    /// Minimum and maximum raw values over the valid pixels.
    pub fn valid_range(&self) -> Option<(i16, i16)> {
        self.data
            .iter()
            .copied()
            .filter(|&v| v != INVALID_DISPARITY)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v)))
            })
    }

    /// Row-major view of the raw fixed-point values.
    pub fn as_raw(&self) -> &[i16] {
        &self.data
    }

    pub(crate) fn as_raw_mut(&mut self) -> &mut [i16] {
        &mut self.data
    }

    /// Converts the map to a GrayImage normalised over its valid range.
    ///
    /// Invalid pixels are black.
    pub fn to_luma_normalised(&self) -> GrayImage {
        visualise::normalise(self)
    }

    /// Converts the map to a JET colour-mapped image for display.
    pub fn to_color_mapped(&self) -> RgbImage {
        visualise::apply_jet(&self.to_luma_normalised())
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
