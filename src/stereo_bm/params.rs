//! Block matching parameters.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Largest disparity search range whose fixed-point values still fit an `i16`.
pub const MAX_NUM_DISPARITIES: usize = 2048;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Normalisation applied to both images before matching.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreFilterType {
    /// Subtract the local box mean from every pixel.
    #[serde(rename = "normalized_response")]
    NormalizedResponse,

    /// Horizontal Sobel derivative.
    #[serde(rename = "xsobel")]
    XSobel
}

/// Configuration of the block matching engine.
///
/// Missing keys take their default values when deserialised, so a config file only needs to
/// name the values it changes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct StereoParams {
    /// Size of the disparity search range, a positive multiple of 16.
    pub num_disparities: usize,
    /// Side of the square matching window, odd and at least 5.
    pub block_size: usize,
    pub pre_filter_type: PreFilterType,
    /// Window of the normalised response pre-filter, odd in `5..=255`.
    pub pre_filter_size: usize,
    /// Pre-filtered values are clipped to `±pre_filter_cap`, in `1..=63`.
    pub pre_filter_cap: u32,
    pub texture_threshold: u32,
    /// Margin in percent by which the best cost must beat every non-adjacent candidate.
    pub uniqueness_ratio: u32,
    /// Connected regions smaller than this are removed as speckles, 0 disables the filter.
    pub speckle_window_size: usize,
    /// Maximum disparity difference in pixels within one connected region, at most
    /// [`MAX_NUM_DISPARITIES`].
    pub speckle_range: u32
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for StereoParams {
    fn default() -> Self {
        Self {
            num_disparities: 64,
            block_size: 15,
            pre_filter_type: PreFilterType::XSobel,
            pre_filter_size: 5,
            pre_filter_cap: 31,
            texture_threshold: 10,
            uniqueness_ratio: 15,
            speckle_window_size: 0,
            speckle_range: 0
        }
    }
}

impl StereoParams {
    /// Check every parameter against its legal range.
    pub fn validate(&self) -> Result<()> {
        if self.block_size < 5 || self.block_size > 255 || self.block_size % 2 == 0 {
            return Err(Error::InvalidParams(format!(
                "block_size must be odd and within 5..=255, got {}",
                self.block_size
            )));
        }

        if self.num_disparities == 0
            || self.num_disparities % 16 != 0
            || self.num_disparities > MAX_NUM_DISPARITIES
        {
            return Err(Error::InvalidParams(format!(
                "num_disparities must be a positive multiple of 16 no greater than {}, got {}",
                MAX_NUM_DISPARITIES, self.num_disparities
            )));
        }

        if self.pre_filter_size < 5 || self.pre_filter_size > 255 || self.pre_filter_size % 2 == 0 {
            return Err(Error::InvalidParams(format!(
                "pre_filter_size must be odd and within 5..=255, got {}",
                self.pre_filter_size
            )));
        }

        if self.pre_filter_cap < 1 || self.pre_filter_cap > 63 {
            return Err(Error::InvalidParams(format!(
                "pre_filter_cap must be within 1..=63, got {}",
                self.pre_filter_cap
            )));
        }

        if self.speckle_range as usize > MAX_NUM_DISPARITIES {
            return Err(Error::InvalidParams(format!(
                "speckle_range must be no greater than {}, got {}",
                MAX_NUM_DISPARITIES, self.speckle_range
            )));
        }

        Ok(())
    }

    /// Parse parameters from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let params: StereoParams = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
