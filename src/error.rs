//! # Error standards
//!
//! This module provides a standardised error enum and result type for this crate.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::PathBuf;

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the stereo crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input images cannot be matched, for example because their dimensions differ.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The stereo parameters are outside of their legal ranges.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// An image could not be loaded from disk.
    #[error("Could not load image {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse parameters: {0}")]
    Config(#[from] toml::de::Error),

    /// Plotting failed while producing statistics.
    #[cfg(feature = "statistics")]
    #[error("Plotting error: {0}")]
    Plot(String)
}
