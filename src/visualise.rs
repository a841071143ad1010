//! # Disparity visualisation
//!
//! Normalisation and colour mapping of disparity maps for display.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::disparity::{DisparityMap, INVALID_DISPARITY};

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Stretch the valid disparities of a map over `1..=255`.
///
/// The smallest valid disparity maps to 1 and the largest to 255, leaving 0 for invalid pixels
/// so they stay below every valid value. A map holding a single disparity value maps it to 1.
pub fn normalise(map: &DisparityMap) -> GrayImage {
    let mut new = GrayImage::new(map.width() as u32, map.height() as u32);

    let (min, max) = match map.valid_range() {
        Some(range) => range,
        None => return new
    };
    let range = (max as i32 - min as i32).max(1);

    for (raw, px) in map.as_raw().iter().zip(new.pixels_mut()) {
        if *raw == INVALID_DISPARITY {
            continue;
        }

        let val = 1 + ((*raw as i32 - min as i32) * 254 + range / 2) / range;
        *px = Luma([val as u8]);
    }

    new
}

/// Apply the JET colour map to a grayscale image.
pub fn apply_jet(img: &GrayImage) -> RgbImage {
    let mut new = RgbImage::new(img.width(), img.height());

    for (src, dst) in img.pixels().zip(new.pixels_mut()) {
        *dst = jet(src[0]);
    }

    new
}

/// JET colour of a single intensity: dark blue, blue, cyan, yellow, red, dark red.
///
/// The breakpoints sit at 1/8, 3/8, 5/8 and 7/8 of the range, and each ramp climbs by four
/// levels per intensity step.
pub fn jet(val: u8) -> Rgb<u8> {
    let v = val as i32 * 8;
    let ramp = |twice: i32| (twice / 2).max(0).min(255) as u8;

    match val {
        0..=31 => Rgb([0, 0, 128 + (val as i32 * 1016 / 255) as u8]),
        32..=95 => Rgb([0, ramp(v - 255), 255]),
        96..=159 => Rgb([ramp(v - 765), 255, ramp(1275 - v)]),
        160..=223 => Rgb([255, ramp(1785 - v), 0]),
        _ => Rgb([255 - ramp(v - 1785), 0, 0])
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalise_stretches_valid_range() {
        let mut map = DisparityMap::new(4, 1);
        map.put_raw(0, 0, 32);
        map.put_raw(1, 0, 64);
        map.put_raw(2, 0, 96);

        let img = normalise(&map);

        assert_eq!(img.get_pixel(0, 0)[0], 1);
        assert_eq!(img.get_pixel(1, 0)[0], 128);
        assert_eq!(img.get_pixel(2, 0)[0], 255);
        assert_eq!(img.get_pixel(3, 0)[0], 0);
    }

    #[test]
    fn nearest_valid_pixels_differ_from_holes() {
        let mut map = DisparityMap::new(3, 1);
        map.put_raw(0, 0, 0);
        map.put_raw(1, 0, 5 * 16);

        let img = normalise(&map);
        assert_eq!(img.get_pixel(0, 0)[0], 1);
        assert_eq!(img.get_pixel(2, 0)[0], 0);

        let colour = apply_jet(&img);
        assert_ne!(colour.get_pixel(0, 0), colour.get_pixel(2, 0));

        let mut flat = DisparityMap::new(2, 1);
        flat.put_raw(0, 0, 48);
        assert_eq!(normalise(&flat).get_pixel(0, 0)[0], 1);
    }

    #[test]
    fn normalise_empty_map_is_black() {
        let img = normalise(&DisparityMap::new(5, 5));
        assert!(img.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn jet_endpoints() {
        assert_eq!(jet(0), Rgb([0, 0, 128]));
        assert_eq!(jet(128), Rgb([129, 255, 125]));
        assert_eq!(jet(255), Rgb([128, 0, 0]));

        let img = apply_jet(&GrayImage::from_pixel(3, 2, Luma([0])));
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 128])));
    }
}
