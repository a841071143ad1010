//! # Stereo frames
//!
//! Rectified grayscale image pairs fed to the disparity algorithms.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use image::{imageops, DynamicImage, GenericImageView, GrayImage};

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A rectified stereo pair of equally sized grayscale images.
#[derive(Debug, Clone)]
pub struct StereoPair {
    left: GrayImage,
    right: GrayImage
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl StereoPair {
    /// Build a pair from two grayscale images, which must have identical dimensions.
    pub fn new(left: GrayImage, right: GrayImage) -> Result<Self> {
        if left.dimensions() != right.dimensions() {
            return Err(Error::InvalidInput(format!(
                "left image is {}x{} but right image is {}x{}",
                left.width(),
                left.height(),
                right.width(),
                right.height()
            )));
        }

        Ok(Self { left, right })
    }

    /// Split a side-by-side stereo image into its left and right halves.
    ///
    /// The image is converted to grayscale first. If the width is odd the last column is
    /// dropped so that both halves have the same size.
    pub fn from_side_by_side(img: &DynamicImage) -> Result<Self> {
        let gray = imageops::grayscale(img);
        let (width, height) = gray.dimensions();
        let mid = width / 2;

        if mid == 0 {
            return Err(Error::InvalidInput(format!(
                "side-by-side image is only {} pixels wide",
                width
            )));
        }

        let left = imageops::crop_imm(&gray, 0, 0, mid, height).to_image();
        let right = imageops::crop_imm(&gray, mid, 0, mid, height).to_image();

        Self::new(left, right)
    }

    /// Load a side-by-side stereo image from disk and split it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| Error::Load {
            path: path.to_path_buf(),
            source
        })?;

        log::debug!(
            "Loaded {} ({}x{})",
            path.display(),
            img.width(),
            img.height()
        );

        Self::from_side_by_side(&img)
    }

    pub fn left(&self) -> &GrayImage {
        &self.left
    }

    pub fn right(&self) -> &GrayImage {
        &self.right
    }

    pub fn width(&self) -> usize {
        self.left.width() as usize
    }

    pub fn height(&self) -> usize {
        self.left.height() as usize
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
