use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cv_stereobm::prelude::*;
use image::{GrayImage, Luma};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn noise(x: u32, y: u32) -> u8 {
    let mut h = x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    (h >> 24) as u8
}

fn stereo_bm_bench(c: &mut Criterion) {

    // Build a VGA pair with a constant 20 pixel shift
    let left = GrayImage::from_fn(WIDTH, HEIGHT, |x, y| Luma([noise(x, y)]));
    let right = GrayImage::from_fn(WIDTH, HEIGHT, |x, y| Luma([noise(x + 20, y)]));
    let pair = StereoPair::new(left, right).unwrap();

    // Build disparity alg with the default parameters
    let mut disp = StereoBM::new(StereoParams::default()).unwrap();

    c.bench_function("stereo_bm vga 64 disparities", |b| b.iter(|| disp.compute(black_box(&pair))));

    let mut disp = StereoBM::new(StereoParams {
        speckle_window_size: 100,
        speckle_range: 2,
        ..StereoParams::default()
    }).unwrap();

    c.bench_function("stereo_bm vga speckle filtered", |b| b.iter(|| disp.compute(black_box(&pair))));
}

criterion_group!(benches, stereo_bm_bench);
criterion_main!(benches);
