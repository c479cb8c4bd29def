use std::{thread, time::Duration};

use anyhow::{Result, anyhow};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
};

use super::{FrameSource, rgb_converter};
use crate::{error::CloakError, types::Frame};

// Prefer pixel formats that are widely supported on macOS (the built-in cameras
// often reject YUYV even though Nokhwa reports it).
const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
    FrameFormat::RAWRGB,
    FrameFormat::RAWBGR,
    FrameFormat::GRAY,
    FrameFormat::YUYV,
    FrameFormat::NV12,
    FrameFormat::MJPEG,
];

fn requested_formats() -> [RequestedFormat<'static>; 4] {
    [
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestFrameRate,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestResolution,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

#[derive(Clone, Debug)]
pub struct CameraDevice {
    pub index: CameraIndex,
    pub label: String,
}

pub fn available_cameras() -> Result<Vec<CameraDevice>> {
    let cameras = query(ApiBackend::Auto)?;
    Ok(cameras
        .into_iter()
        .map(|info| CameraDevice {
            index: info.index().clone(),
            label: info.human_name(),
        })
        .collect())
}

fn build_camera(index: CameraIndex) -> Result<Camera> {
    let mut last_err = None;

    for requested in requested_formats() {
        match Camera::new(index.clone(), requested) {
            Ok(mut camera) => match camera.open_stream() {
                Ok(()) => return Ok(camera),
                Err(err) => last_err = Some(err.into()),
            },
            Err(err) => last_err = Some(err.into()),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("failed to open camera with any supported format")))
}

/// Live camera feed. The stream is stopped when this is dropped.
pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    /// Opens the camera and blocks for `warmup` so auto exposure can settle.
    pub fn open(device_index: u32, warmup: Duration) -> Result<Self, CloakError> {
        let camera = build_camera(CameraIndex::Index(device_index))
            .map_err(|err| CloakError::SourceUnavailable(format!("camera {device_index}: {err:#}")))?;

        log::info!(
            "opened camera {} ({}) at {}",
            device_index,
            camera.info().human_name(),
            camera.camera_format()
        );

        if !warmup.is_zero() {
            log::debug!("waiting {warmup:?} for the camera to settle");
            thread::sleep(warmup);
        }

        Ok(Self { camera })
    }
}

impl FrameSource for CameraSource {
    fn is_open(&self) -> bool {
        self.camera.is_stream_open()
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let buffer = self.camera.frame()?;
        rgb_converter::convert_camera_frame(&buffer).map(Some)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(err) = self.camera.stop_stream() {
            log::warn!("failed to stop camera stream: {err:?}");
        } else {
            log::debug!("camera stream stopped");
        }
    }
}
