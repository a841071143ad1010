//! Compute the disparity map of a side-by-side stereo image and write or display it as a
//! colour-mapped image.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cv_stereobm::{prelude::*, Error};

#[cfg(feature = "display")]
use minifb::{Key, Window, WindowOptions};

// -----------------------------------------------------------------------------------------------
// ARGUMENTS
// -----------------------------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(author, version, about = "Compute the disparity map of a side-by-side stereo image")]
struct Args {
    /// Side-by-side stereo image, left view in the left half
    image: PathBuf,

    /// TOML file of block matching parameters
    #[arg(short, long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// Output PNG path [default: <IMAGE>_disparity.png]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Show the colour-mapped disparity in a window, close with Esc
    #[cfg(feature = "display")]
    #[arg(short, long)]
    display: bool,

    /// Also plot the disparity histogram to this PNG path
    #[cfg(feature = "statistics")]
    #[arg(long, value_name = "FILE")]
    histogram: Option<PathBuf>
}

// -----------------------------------------------------------------------------------------------
// MAIN
// -----------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let params = match &args.params {
        Some(path) => StereoParams::from_toml_file(path)
            .with_context(|| format!("Failed to read parameters from {}", path.display()))?,
        None => StereoParams::default()
    };

    let pair = match StereoPair::open(&args.image) {
        Ok(pair) => pair,
        Err(e @ Error::Load { .. }) => {
            eprintln!("Error: {}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into())
    };

    log::info!(
        "Matching {}x{} views with {} disparities, block size {}",
        pair.width(),
        pair.height(),
        params.num_disparities,
        params.block_size
    );

    let disp_map = StereoBM::new(params)?
        .compute(&pair)
        .context("Failed to compute disparity")?;

    let coloured = disp_map.to_color_mapped();

    #[cfg(feature = "statistics")]
    {
        if let Some(path) = &args.histogram {
            cv_stereobm::statistics::plot_histogram(&disp_map, path)?;
        }
    }

    #[cfg(feature = "display")]
    let write = args.output.is_some() || !args.display;
    #[cfg(not(feature = "display"))]
    let write = true;

    if write {
        let out_path = match &args.output {
            Some(path) => path.clone(),
            None => derive_output_path(&args.image)?
        };
        coloured
            .save(&out_path)
            .with_context(|| format!("Failed to save disparity image: {}", out_path.display()))?;
        println!("Wrote: {}", out_path.display());
    }

    #[cfg(feature = "display")]
    {
        if args.display {
            show(&coloured)?;
        }
    }

    println!("Processing complete");
    Ok(())
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn init_logger() {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

/// `dir/name.ext` becomes `dir/name_disparity.png`.
fn derive_output_path(input: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Input path has no file name: {}", input.display()))?;

    Ok(input.with_file_name(format!("{}_disparity.png", stem)))
}

#[cfg(feature = "display")]
fn show(img: &image::RgbImage) -> Result<()> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let buffer: Vec<u32> = img
        .pixels()
        .map(|p| (p[0] as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32)
        .collect();

    let mut window = Window::new("Disparity Map", width, height, WindowOptions::default())
        .map_err(|e| anyhow::anyhow!("Failed to open window: {:?}", e))?;

    window.limit_update_rate(Some(std::time::Duration::from_micros(16600)));

    while window.is_open() && !window.is_key_down(Key::Escape) {
        window
            .update_with_buffer(&buffer, width, height)
            .map_err(|e| anyhow::anyhow!("Failed to update window: {:?}", e))?;
    }

    Ok(())
}
