//! Speckle removal by connected-component labelling.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::disparity::{DisparityMap, INVALID_DISPARITY};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Removes small connected regions of similar disparity.
///
/// The label array and flood-fill stack are kept between calls so repeated filtering of maps
/// of the same size doesn't reallocate.
#[derive(Debug, Default)]
pub struct SpeckleFilter {
    /// Region label per pixel, 0 means unlabelled.
    labels: Vec<u32>,
    /// Whether each region is a speckle, indexed by `label - 1`.
    is_speckle: Vec<bool>,
    stack: Vec<usize>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl SpeckleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every 4-connected region with fewer than `max_speckle_size` pixels.
    ///
    /// Neighbouring valid pixels belong to the same region when their raw fixed-point values
    /// differ by at most `max_diff`. Returns the number of pixels invalidated.
    pub fn apply(&mut self, map: &mut DisparityMap, max_speckle_size: usize, max_diff: i32) -> usize {
        if max_speckle_size == 0 {
            return 0;
        }

        let width = map.width();
        let height = map.height();
        let data = map.as_raw_mut();

        self.labels.clear();
        self.labels.resize(width * height, 0);
        self.is_speckle.clear();
        self.stack.clear();

        let mut removed = 0;

        for i in 0..data.len() {
            if data[i] == INVALID_DISPARITY {
                continue;
            }

            // Regions are labelled from their first pixel in scan order, so every other pixel
            // of a region is visited after its label is known.
            if self.labels[i] != 0 {
                if self.is_speckle[self.labels[i] as usize - 1] {
                    data[i] = INVALID_DISPARITY;
                    removed += 1;
                }
                continue;
            }

            self.is_speckle.push(false);
            let label = self.is_speckle.len() as u32;
            self.labels[i] = label;
            self.stack.push(i);
            let mut count = 0usize;

            while let Some(p) = self.stack.pop() {
                count += 1;
                let val = data[p] as i32;
                let (x, y) = (p % width, p / width);

                let mut visit = |q: usize| {
                    let other = data[q];
                    if self.labels[q] == 0
                        && other != INVALID_DISPARITY
                        && (other as i32 - val).abs() <= max_diff
                    {
                        self.labels[q] = label;
                        self.stack.push(q);
                    }
                };

                if x > 0 {
                    visit(p - 1);
                }
                if x + 1 < width {
                    visit(p + 1);
                }
                if y > 0 {
                    visit(p - width);
                }
                if y + 1 < height {
                    visit(p + width);
                }
            }

            if count < max_speckle_size {
                self.is_speckle[label as usize - 1] = true;
                data[i] = INVALID_DISPARITY;
                removed += 1;
            }
        }

        removed
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn smooth_map(width: usize, height: usize) -> DisparityMap {
        let mut map = DisparityMap::new(width, height);
        for y in 0..height {
            for x in 0..width {
                // Gentle ramp, neighbours never differ by more than one pixel
                map.put_raw(x, y, (160 + (x / 4) * 16) as i16);
            }
        }
        map
    }

    #[test]
    fn salt_outliers_are_removed() {
        let mut map = smooth_map(32, 16);
        map.put_raw(10, 5, 900);
        map.put_raw(20, 11, 1200);
        map.put_raw(21, 11, 1200);

        let mut filter = SpeckleFilter::new();
        let removed = filter.apply(&mut map, 4, 16);

        assert_eq!(removed, 3);
        assert!(!map.is_valid(10, 5));
        assert!(!map.is_valid(20, 11));
        assert!(!map.is_valid(21, 11));
        assert_eq!(map.valid_count(), 32 * 16 - 3);
    }

    #[test]
    fn regions_at_window_size_survive() {
        let mut map = smooth_map(32, 16);
        map.put_raw(3, 3, 800);
        map.put_raw(4, 3, 800);

        let mut filter = SpeckleFilter::new();
        assert_eq!(filter.apply(&mut map, 2, 16), 0);
        assert_eq!(filter.apply(&mut map, 3, 16), 2);
    }

    #[test]
    fn large_range_merges_outliers() {
        let mut map = smooth_map(32, 16);
        map.put_raw(10, 5, 300);

        let mut filter = SpeckleFilter::new();
        assert_eq!(filter.apply(&mut map, 4, 200), 0);
        assert!(map.is_valid(10, 5));
    }

    #[test]
    fn invalid_pixels_split_regions() {
        let mut map = DisparityMap::new(9, 1);
        for x in 0..9 {
            if x != 4 {
                map.put_raw(x, 0, 32);
            }
        }

        let mut filter = SpeckleFilter::new();
        assert_eq!(filter.apply(&mut map, 5, 16), 8);
        assert_eq!(map.valid_count(), 0);
    }

    #[test]
    fn scratch_is_reused() {
        let mut filter = SpeckleFilter::new();

        let mut first = smooth_map(32, 16);
        first.put_raw(10, 5, 900);
        let mut second = first.clone();

        filter.apply(&mut first, 4, 16);
        filter.apply(&mut second, 4, 16);
        assert_eq!(first, second);
    }
}
