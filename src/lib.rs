//! # Stereo Block Matching
//!
//! This crate provides dense disparity map computation from rectified grayscale stereo pairs
//! using sum-of-absolute-differences block matching.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod disparity;
mod error;
mod frame;
pub mod statistics;
pub mod stereo_bm;
pub mod visualise;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use disparity::{DisparityAlgorithm, DisparityMap, DISP_SCALE, DISP_SHIFT, INVALID_DISPARITY};
pub use error::{Error, Result};
pub use frame::StereoPair;

pub mod prelude {
    pub use crate::disparity::{DisparityAlgorithm, DisparityMap};
    pub use crate::frame::StereoPair;
    pub use crate::stereo_bm::{PreFilterType, StereoBM, StereoParams};
}
