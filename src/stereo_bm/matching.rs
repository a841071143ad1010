//! SAD cost aggregation and winner selection.
//!
//! Costs are aggregated with an arena of per-column running sums. For every column `x` and
//! disparity `d` the arena holds the SAD of the vertical strip of `block_size` rows between
//! the left image at `x` and the right image at `x - d`. Moving down one row adds the new row
//! and removes the oldest, and moving right along a row adds one column and removes another,
//! so each pixel costs O(num_disparities) regardless of the block size.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use super::params::StereoParams;
use crate::disparity::{DISP_SCALE, INVALID_DISPARITY};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Pre-filtered inputs shared by every band of a single computation.
pub(crate) struct MatchContext<'a> {
    pub left: &'a [u8],
    pub right: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub params: &'a StereoParams
}

/// Scratch owned by one worker while it processes a band of rows.
struct ColumnSums {
    num_disparities: usize,
    first_column: usize,
    /// Column SADs, `num_disparities` entries per column.
    sad: Vec<u32>,
    /// Column sums of `|left - cap|`.
    texture: Vec<u32>,
    /// Block SADs of the pixel currently being scanned.
    block: Vec<u32>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl ColumnSums {
    fn new(width: usize, num_disparities: usize) -> Self {
        Self {
            num_disparities,
            // Columns left of this can't be reached by any disparity without leaving the image
            first_column: num_disparities - 1,
            sad: vec![0; width * num_disparities],
            texture: vec![0; width],
            block: vec![0; num_disparities]
        }
    }

    /// Add (or remove) one image row to every column strip.
    fn update_row(&mut self, left_row: &[u8], right_row: &[u8], cap: i32, add: bool) {
        let nd = self.num_disparities;

        for cx in self.first_column..left_row.len() {
            let lv = left_row[cx] as i32;
            let col = &mut self.sad[cx * nd..(cx + 1) * nd];

            // Right window reversed so that index d reads right_row[cx - d]
            let right_win = right_row[cx + 1 - nd..=cx].iter().rev();

            let tex = (lv - cap).abs() as u32;
            if add {
                for (c, &rv) in col.iter_mut().zip(right_win) {
                    *c += (lv - rv as i32).abs() as u32;
                }
                self.texture[cx] += tex;
            }
            else {
                for (c, &rv) in col.iter_mut().zip(right_win) {
                    *c -= (lv - rv as i32).abs() as u32;
                }
                self.texture[cx] -= tex;
            }
        }
    }

    /// Slide the block along one row, writing a disparity for every x in `x_start..x_end`.
    fn scan_row(
        &mut self,
        out_row: &mut [i16],
        x_start: usize,
        x_end: usize,
        half: usize,
        params: &StereoParams
    ) {
        let nd = self.num_disparities;

        for b in self.block.iter_mut() {
            *b = 0;
        }
        let mut texture = 0u32;

        for cx in (x_start - half)..=(x_start + half) {
            texture += self.texture[cx];
            for (b, &c) in self.block.iter_mut().zip(&self.sad[cx * nd..(cx + 1) * nd]) {
                *b += c;
            }
        }

        for x in x_start..x_end {
            if x > x_start {
                let add = x + half;
                let sub = x - half - 1;

                texture = texture + self.texture[add] - self.texture[sub];

                let add_col = &self.sad[add * nd..(add + 1) * nd];
                let sub_col = &self.sad[sub * nd..(sub + 1) * nd];
                for ((b, &a), &s) in self.block.iter_mut().zip(add_col).zip(sub_col) {
                    *b = *b + a - s;
                }
            }

            out_row[x] = select_disparity(&self.block, texture, params);
        }
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Compute disparities for the band of rows starting at `y0`.
///
/// `out` holds whole rows of the output map and must already be filled with the invalid
/// sentinel; pixels outside the matchable region are left untouched.
pub(crate) fn match_band(ctx: &MatchContext, y0: usize, out: &mut [i16]) {
    let width = ctx.width;
    let nd = ctx.params.num_disparities;
    let half = ctx.params.block_size / 2;
    let cap = ctx.params.pre_filter_cap as i32;
    let rows = out.len() / width;

    let y_start = y0.max(half);
    let y_end = (y0 + rows).min(ctx.height - half);
    if y_start >= y_end {
        return;
    }

    let x_start = half + nd - 1;
    let x_end = width - half;

    let row = |y: usize| y * width..(y + 1) * width;

    let mut sums = ColumnSums::new(width, nd);

    for y in (y_start - half)..=(y_start + half) {
        sums.update_row(&ctx.left[row(y)], &ctx.right[row(y)], cap, true);
    }

    for y in y_start..y_end {
        if y > y_start {
            let new = y + half;
            let old = y - half - 1;
            sums.update_row(&ctx.left[row(new)], &ctx.right[row(new)], cap, true);
            sums.update_row(&ctx.left[row(old)], &ctx.right[row(old)], cap, false);
        }

        let local = y - y0;
        let out_row = &mut out[local * width..(local + 1) * width];
        sums.scan_row(out_row, x_start, x_end, half, ctx.params);
    }
}

/// Pick the disparity for one pixel from its block costs.
///
/// Returns the fixed-point disparity, or the invalid sentinel if the block has too little
/// texture or the minimum is not unique.
pub(crate) fn select_disparity(costs: &[u32], texture: u32, params: &StereoParams) -> i16 {
    if texture < params.texture_threshold {
        return INVALID_DISPARITY;
    }

    let (best_d, best) = costs
        .iter()
        .enumerate()
        .fold((0, u32::MAX), |(min_d, min), (d, &c)| {
            if c < min {
                (d, c)
            }
            else {
                (min_d, min)
            }
        });

    let best = best as u64;
    let thresh = best + best * params.uniqueness_ratio as u64 / 100;

    let ambiguous = costs
        .iter()
        .enumerate()
        .any(|(d, &c)| c as u64 <= thresh && (d + 1 < best_d || d > best_d + 1));
    if ambiguous {
        return INVALID_DISPARITY;
    }

    refine(costs, best_d)
}

/// Sub-pixel refinement by fitting a parabola through the costs around `d`.
///
/// At either end of the search range one neighbour is missing and the integer disparity is
/// returned.
fn refine(costs: &[u32], d: usize) -> i16 {
    let base = d as i64 * DISP_SCALE as i64;

    if d == 0 || d + 1 >= costs.len() {
        return base as i16;
    }

    let prev = costs[d - 1] as i64;
    let curr = costs[d] as i64;
    let next = costs[d + 1] as i64;

    let denom = prev + next - 2 * curr;
    if denom <= 0 {
        return base as i16;
    }

    // Vertex at (prev - next) / (2 * denom), bounded to half a pixel since curr is the minimum
    let offset = div_round((prev - next) * DISP_SCALE as i64, 2 * denom);

    (base + offset) as i16
}

/// Integer division rounding half away from zero, `den` must be positive.
fn div_round(num: i64, den: i64) -> i64 {
    if num >= 0 {
        (num + den / 2) / den
    }
    else {
        -((-num + den / 2) / den)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StereoParams {
        StereoParams {
            num_disparities: 16,
            block_size: 5,
            pre_filter_cap: 31,
            texture_threshold: 10,
            uniqueness_ratio: 15,
            ..StereoParams::default()
        }
    }

    fn valley(len: usize, at: usize) -> Vec<u32> {
        (0..len).map(|d| 100 + 40 * (d as i64 - at as i64).abs() as u32).collect()
    }

    #[test]
    fn symmetric_valley_is_integer() {
        let costs = valley(16, 6);
        assert_eq!(select_disparity(&costs, 100, &params()), 6 * 16);
    }

    #[test]
    fn asymmetric_valley_is_refined() {
        let mut costs = valley(16, 6);
        costs[7] = 110;

        // Vertex at (140 - 110) / (2 * 50) = 0.3 px
        assert_eq!(select_disparity(&costs, 100, &params()), 6 * 16 + 5);
    }

    #[test]
    fn range_ends_are_not_refined() {
        let mut costs = valley(16, 0);
        costs[1] = 101;
        assert_eq!(select_disparity(&costs, 100, &params()), 0);

        let mut costs = valley(16, 15);
        costs[14] = 101;
        assert_eq!(select_disparity(&costs, 100, &params()), 15 * 16);
    }

    #[test]
    fn low_texture_is_invalid() {
        let costs = valley(16, 6);
        assert_eq!(select_disparity(&costs, 9, &params()), INVALID_DISPARITY);
    }

    #[test]
    fn ambiguous_minimum_is_invalid() {
        let mut costs = valley(16, 6);
        costs[12] = 114;
        assert_eq!(select_disparity(&costs, 100, &params()), INVALID_DISPARITY);

        // Adjacent candidates never count against uniqueness
        let mut costs = valley(16, 6);
        costs[7] = 101;
        assert_ne!(select_disparity(&costs, 100, &params()), INVALID_DISPARITY);
    }

    #[test]
    fn flat_costs_are_invalid() {
        let costs = vec![0; 16];
        assert_eq!(select_disparity(&costs, 100, &params()), INVALID_DISPARITY);
    }

    fn pseudo_random(len: usize, mut seed: u32) -> Vec<u8> {
        (0..len)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                (seed % 63) as u8
            })
            .collect()
    }

    #[test]
    fn running_sums_match_direct_sums() {
        let (width, height) = (40, 14);
        let params = params();
        let left = pseudo_random(width * height, 0x1234_5678);
        let right = pseudo_random(width * height, 0x9abc_def0);

        let ctx = MatchContext {
            left: &left,
            right: &right,
            width,
            height,
            params: &params
        };

        let mut out = vec![INVALID_DISPARITY; width * height];
        match_band(&ctx, 0, &mut out);

        let half = params.block_size / 2;
        let nd = params.num_disparities;
        let cap = params.pre_filter_cap as i32;

        for y in 0..height {
            for x in 0..width {
                let expected = if y < half || y >= height - half || x < half + nd - 1 || x >= width - half {
                    INVALID_DISPARITY
                }
                else {
                    let mut costs = vec![0u32; nd];
                    let mut texture = 0u32;
                    for by in (y - half)..=(y + half) {
                        for bx in (x - half)..=(x + half) {
                            let lv = left[by * width + bx] as i32;
                            texture += (lv - cap).abs() as u32;
                            for (d, c) in costs.iter_mut().enumerate() {
                                *c += (lv - right[by * width + bx - d] as i32).abs() as u32;
                            }
                        }
                    }
                    select_disparity(&costs, texture, &params)
                };

                assert_eq!(out[y * width + x], expected, "mismatch at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn bands_are_independent() {
        let (width, height) = (40, 20);
        let params = params();
        let left = pseudo_random(width * height, 42);
        let right = pseudo_random(width * height, 4242);

        let ctx = MatchContext {
            left: &left,
            right: &right,
            width,
            height,
            params: &params
        };

        let mut whole = vec![INVALID_DISPARITY; width * height];
        match_band(&ctx, 0, &mut whole);

        let mut banded = vec![INVALID_DISPARITY; width * height];
        for (i, chunk) in banded.chunks_mut(width * 3).enumerate() {
            match_band(&ctx, i * 3, chunk);
        }

        assert_eq!(whole, banded);
    }
}
