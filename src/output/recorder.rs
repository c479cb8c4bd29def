//! AVI recording through an `ffmpeg` child process fed raw RGB over stdin.

use std::{
    borrow::Cow,
    io::Write,
    path::PathBuf,
    process::{Child, ChildStdin, Command, Stdio},
};

use fast_image_resize as fir;

use super::FrameSink;
use crate::{config::OutputConfig, error::CloakError, types::Frame};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    Xvid,
    Mjpeg,
}

impl Codec {
    pub fn from_fourcc(fourcc: &str) -> Result<Self, CloakError> {
        match fourcc.to_ascii_uppercase().as_str() {
            "XVID" => Ok(Codec::Xvid),
            "MJPG" => Ok(Codec::Mjpeg),
            other => Err(CloakError::SinkUnavailable(format!(
                "unsupported codec {other:?} (expected XVID or MJPG)"
            ))),
        }
    }

    fn encoder_args(self) -> &'static [&'static str] {
        match self {
            Codec::Xvid => &["-c:v", "mpeg4", "-vtag", "xvid", "-q:v", "5"],
            Codec::Mjpeg => &["-c:v", "mjpeg", "-q:v", "3"],
        }
    }
}

fn encoder_command(config: &OutputConfig, codec: Codec) -> Command {
    let mut command = Command::new(&config.ffmpeg);
    command
        .args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
        .arg("-s")
        .arg(format!("{}x{}", config.width, config.height))
        .arg("-r")
        .arg(config.frame_rate.to_string())
        .args(["-i", "-"])
        .args(codec.encoder_args())
        .arg(&config.path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit());
    command
}

/// Returns the frame's pixels at `width`x`height`, resizing only when the
/// frame does not already match.
fn fit_frame<'f>(
    resizer: &mut fir::Resizer,
    frame: &'f Frame,
    width: u32,
    height: u32,
) -> Result<Cow<'f, [u8]>, CloakError> {
    if frame.width == width && frame.height == height {
        return Ok(Cow::Borrowed(&frame.rgb));
    }

    let resize_err = |err: String| CloakError::SinkUnavailable(format!("resize failed: {err}"));
    let src_image = fir::images::Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.rgb.clone(),
        fir::PixelType::U8x3,
    )
    .map_err(|err| resize_err(err.to_string()))?;
    let mut dst_image = fir::images::Image::new(width, height, fir::PixelType::U8x3);
    let resize_options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    resizer
        .resize(&src_image, &mut dst_image, Some(&resize_options))
        .map_err(|err| resize_err(err.to_string()))?;

    Ok(Cow::Owned(dst_image.into_vec()))
}

pub struct VideoRecorder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    path: PathBuf,
    width: u32,
    height: u32,
    resizer: fir::Resizer,
    frames_written: u64,
}

impl VideoRecorder {
    pub fn open(config: &OutputConfig) -> Result<Self, CloakError> {
        let codec = Codec::from_fourcc(&config.codec)?;
        let mut child = encoder_command(config, codec).spawn().map_err(|err| {
            CloakError::SinkUnavailable(format!(
                "failed to start encoder {}: {err}",
                config.ffmpeg.display()
            ))
        })?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CloakError::SinkUnavailable(
                "encoder stdin was not captured".to_string(),
            ));
        };

        log::info!(
            "recording {}x{} @ {} fps ({:?}) to {}",
            config.width,
            config.height,
            config.frame_rate,
            codec,
            config.path.display()
        );

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            path: config.path.clone(),
            width: config.width,
            height: config.height,
            resizer: fir::Resizer::new(),
            frames_written: 0,
        })
    }
}

impl FrameSink for VideoRecorder {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), CloakError> {
        let pixels = fit_frame(&mut self.resizer, frame, self.width, self.height)?;
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CloakError::SinkUnavailable(format!(
                "recording to {} is already closed",
                self.path.display()
            )));
        };

        stdin.write_all(&pixels).map_err(|err| {
            CloakError::SinkUnavailable(format!(
                "failed to write frame {} to {}: {err}",
                self.frames_written,
                self.path.display()
            ))
        })?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CloakError> {
        // Closing stdin is the encoder's end-of-stream.
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child.wait().map_err(|err| {
            CloakError::SinkUnavailable(format!("failed to wait for encoder: {err}"))
        })?;
        if !status.success() {
            return Err(CloakError::SinkUnavailable(format!(
                "encoder exited with {status} while writing {}",
                self.path.display()
            )));
        }

        log::info!(
            "finalized {} ({} frames)",
            self.path.display(),
            self.frames_written
        );
        Ok(())
    }
}

impl Drop for VideoRecorder {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            log::error!("failed to finalize recording: {err}");
        }
    }
}
