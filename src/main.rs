mod args;
mod config;
mod error;
mod output;
mod pipeline;
mod session;
mod types;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use args::Args;
use config::CloakConfig;

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    if args.list {
        return list_cameras();
    }

    let mut config = match &args.config {
        Some(path) => CloakConfig::from_file(path)?,
        None => {
            log::info!("no config file given, using built-in defaults");
            CloakConfig::default()
        }
    };
    args.apply(&mut config);
    config.validate()?;

    run(&config, args.save_background)
}

#[cfg(feature = "camera-nokhwa")]
fn list_cameras() -> Result<()> {
    let cameras = pipeline::available_cameras().context("failed to enumerate cameras")?;
    if cameras.is_empty() {
        println!("No cameras found");
        return Ok(());
    }

    println!("{:<8} | Name", "Index");
    println!("{}", "-".repeat(40));
    for camera in cameras {
        println!("{:<8} | {}", camera.index, camera.label);
    }
    Ok(())
}

#[cfg(feature = "camera-nokhwa")]
fn run(config: &CloakConfig, save_background: Option<PathBuf>) -> Result<()> {
    use output::{VideoRecorder, WindowDisplay};
    use pipeline::CameraSource;
    use session::CloakSession;

    let source = CameraSource::open(config.camera.device_index, config.camera.warmup())?;
    let recorder = VideoRecorder::open(&config.output)?;
    let display = WindowDisplay::open(
        &config.output.window_title,
        config.output.width,
        config.output.height,
        config.output.frame_rate,
    )?;

    let session = CloakSession::new(
        source,
        recorder,
        display,
        &config.cloak,
        config.camera.max_read_retries,
    )
    .with_background_snapshot(save_background);

    log::info!(
        "capturing {} background frames, step out of the picture",
        config.cloak.background_frames
    );
    let summary = session.run().context("cloak session failed")?;
    log::info!(
        "done: {} frames composited ({:?})",
        summary.frames,
        summary.reason
    );
    Ok(())
}

#[cfg(not(feature = "camera-nokhwa"))]
fn list_cameras() -> Result<()> {
    anyhow::bail!("built without camera support (enable the `camera-nokhwa` feature)")
}

#[cfg(not(feature = "camera-nokhwa"))]
fn run(_config: &CloakConfig, _save_background: Option<PathBuf>) -> Result<()> {
    Err(error::CloakError::SourceUnavailable(
        "built without camera support (enable the `camera-nokhwa` feature)".to_string(),
    )
    .into())
}
