//! # Disparity statistics
//!
//! Histograms of computed disparity maps, with optional plotting behind the `statistics`
//! feature.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::disparity::{DisparityMap, DISP_SCALE, INVALID_DISPARITY};

#[cfg(feature = "statistics")]
use crate::error::*;
#[cfg(feature = "statistics")]
use plotters::prelude::*;
#[cfg(feature = "statistics")]
use std::path::Path;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Count the valid pixels at each whole-pixel disparity.
///
/// Sub-pixel values are truncated, so bin `d` covers disparities in `[d, d + 1)`.
pub fn histogram(map: &DisparityMap) -> Vec<usize> {
    let mut bins: Vec<usize> = Vec::new();

    for &raw in map.as_raw() {
        if raw == INVALID_DISPARITY || raw < 0 {
            continue;
        }

        let bin = (raw as i32 / DISP_SCALE) as usize;
        if bin >= bins.len() {
            bins.resize(bin + 1, 0);
        }
        bins[bin] += 1;
    }

    bins
}

/// Plot the disparity histogram of the map to a PNG file.
#[cfg(feature = "statistics")]
pub fn plot_histogram<P: AsRef<Path>>(map: &DisparityMap, path: P) -> Result<()> {
    let bins = histogram(map);
    let max_count = bins.iter().copied().max().unwrap_or(0) + 1;

    let area = BitMapBackend::new(path.as_ref(), (800, 600)).into_drawing_area();
    area.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&area)
        .caption("Disparity histogram", ("sans-serif", 20).into_font())
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_ranged(0..bins.len().max(1), 0..max_count)
        .map_err(plot_err)?;

    chart.configure_mesh().draw().map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            bins.iter().copied().enumerate(),
            &BLUE
        ))
        .map_err(plot_err)?;

    log::info!("Disparity histogram written to {}", path.as_ref().display());

    Ok(())
}

#[cfg(feature = "statistics")]
fn plot_err<E: std::fmt::Debug>(e: E) -> Error {
    Error::Plot(format!("{:?}", e))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
