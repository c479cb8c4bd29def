//! Applies the cloak to a still image pair:
//! `cargo run --example cloak_from_images -- <background> <frame> <output>`
#[allow(dead_code)]
#[path = "../src/pipeline/compositor.rs"]
mod compositor;
#[allow(dead_code)]
#[path = "../src/config.rs"]
mod config;
#[allow(dead_code)]
#[path = "../src/error.rs"]
mod error;
#[allow(dead_code)]
#[path = "../src/pipeline/morphology.rs"]
mod morphology;
#[allow(dead_code)]
#[path = "../src/pipeline/segmenter.rs"]
mod segmenter;
#[allow(dead_code)]
#[path = "../src/types.rs"]
mod types;

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};

use compositor::composite;
use config::SegmentationConfig;
use segmenter::Segmenter;
use types::{Background, Frame};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let background_image = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demo/background.png"));
    let input_image = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demo/cloak.png"));
    let output_image = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demo/cloak_composited.png"));

    let background = Background::new(
        load_frame(&background_image).context("failed to read background image")?,
    );
    let frame = load_frame(&input_image).context("failed to read input image")?;

    let settings = SegmentationConfig::default();
    let segmenter = Segmenter::new(settings.color_ranges, settings.kernel_size);
    let mask = segmenter.segment(&frame);
    println!(
        "{} of {} pixels matched the cloak color in {}",
        mask.count(),
        mask.cells.len(),
        input_image.display()
    );

    let output = composite(&frame, &background, &mask)?;
    output
        .to_image()
        .ok_or_else(|| anyhow!("failed to build image buffer"))?
        .save(&output_image)
        .with_context(|| format!("failed to save {}", output_image.display()))?;
    println!("Wrote {}", output_image.display());

    Ok(())
}

fn load_frame(path: &Path) -> Result<Frame> {
    let image = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_rgb8();
    Ok(Frame::from_image(image))
}
