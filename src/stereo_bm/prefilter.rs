//! Intensity normalisation applied before matching.
//!
//! Both pre-filters produce values in `0..=2 * cap`, where `cap` is the neutral response.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;
use imageproc::{filter::box_filter, gradients::horizontal_sobel};

use super::params::{PreFilterType, StereoParams};

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Pre-filter the image, returning a row-major buffer of clipped responses.
pub(crate) fn pre_filter(img: &GrayImage, params: &StereoParams) -> Vec<u8> {
    let cap = params.pre_filter_cap as i32;

    match params.pre_filter_type {
        PreFilterType::NormalizedResponse => {
            let radius = (params.pre_filter_size / 2) as u32;
            let mean = box_filter(img, radius, radius);

            img.as_raw()
                .iter()
                .zip(mean.as_raw().iter())
                .map(|(&v, &m)| clip(v as i32 - m as i32, cap))
                .collect()
        }
        PreFilterType::XSobel => {
            let (width, height) = (img.width() as usize, img.height() as usize);
            let sobel = horizontal_sobel(img);
            let mut out: Vec<u8> = sobel
                .as_raw()
                .iter()
                .map(|&v| clip(v as i32, cap))
                .collect();

            // Border pixels have no full 3x3 neighbourhood and are held neutral.
            let neutral = cap as u8;
            for y in 0..height {
                out[y * width] = neutral;
                out[y * width + width - 1] = neutral;
            }
            for x in 0..width {
                out[x] = neutral;
                out[(height - 1) * width + x] = neutral;
            }

            out
        }
    }
}

fn clip(v: i32, cap: i32) -> u8 {
    (v.max(-cap).min(cap) + cap) as u8
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn params(pre_filter_type: PreFilterType) -> StereoParams {
        StereoParams {
            pre_filter_type,
            pre_filter_cap: 31,
            ..StereoParams::default()
        }
    }

    #[test]
    fn uniform_image_is_neutral() {
        let img = GrayImage::from_pixel(20, 10, Luma([120]));

        for &ty in &[PreFilterType::NormalizedResponse, PreFilterType::XSobel] {
            let out = pre_filter(&img, &params(ty));
            assert_eq!(out.len(), 200);
            assert!(out.iter().all(|&v| v == 31));
        }
    }

    #[test]
    fn sobel_step_is_clipped() {
        let mut img = GrayImage::new(20, 10);
        for y in 0..10 {
            for x in 10..20 {
                img.put_pixel(x, y, Luma([255]));
            }
        }

        let out = pre_filter(&img, &params(PreFilterType::XSobel));

        // The edge saturates, flat regions stay neutral.
        let edge = out[5 * 20 + 10];
        assert!(edge == 0 || edge == 62);
        assert_eq!(out[5 * 20 + 9], edge);
        assert_eq!(out[5 * 20 + 4], 31);
        assert_eq!(out[5 * 20 + 15], 31);
    }

    #[test]
    fn responses_stay_in_range() {
        let mut img = GrayImage::new(32, 16);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Luma([((x * 37 + y * 91) % 256) as u8]);
        }

        for &ty in &[PreFilterType::NormalizedResponse, PreFilterType::XSobel] {
            let out = pre_filter(&img, &params(ty));
            assert!(out.iter().all(|&v| v <= 62));
        }
    }
}
