use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::CloakError;

pub const CHANNELS: usize = 3;

/// A packed 8-bit RGB image, row-major, no padding between rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(rgb: Vec<u8>, width: u32, height: u32) -> Result<Self, CloakError> {
        if width == 0 || height == 0 {
            return Err(CloakError::EmptyFrame);
        }

        let expected = width as usize * height as usize * CHANNELS;
        if rgb.len() != expected {
            return Err(CloakError::InvalidFrame {
                expected,
                actual: rgb.len(),
            });
        }

        Ok(Self { rgb, width, height })
    }

    #[allow(dead_code)]
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let rgb = color.repeat(width as usize * height as usize);
        Self { rgb, width, height }
    }

    pub fn row_stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    #[allow(dead_code)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([self.rgb[idx], self.rgb[idx + 1], self.rgb[idx + 2]])
    }

    #[allow(dead_code)]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.rgb[idx..idx + CHANNELS].copy_from_slice(&color);
    }

    pub fn ensure_dimensions(&self, width: u32, height: u32) -> Result<(), CloakError> {
        if self.width == width && self.height == height {
            return Ok(());
        }
        Err(CloakError::DimensionMismatch {
            expected_width: width,
            expected_height: height,
            actual_width: self.width,
            actual_height: self.height,
        })
    }

    pub fn to_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.rgb.clone())
    }

    #[allow(dead_code)]
    pub fn from_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            rgb: image.into_raw(),
            width,
            height,
        }
    }
}

/// The replacement plate. Set once at startup; there is no way to mutate it
/// after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Background(Frame);

impl Background {
    pub fn new(frame: Frame) -> Self {
        Self(frame)
    }

    pub fn frame(&self) -> &Frame {
        &self.0
    }
}

/// Per-pixel "cloak color present" flags, same grid as the frame it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub cells: Vec<bool>,
    pub width: u32,
    pub height: u32,
}

impl Mask {
    #[allow(dead_code)]
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            cells: vec![false; width as usize * height as usize],
            width,
            height,
        }
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    #[allow(dead_code)]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.cells[y as usize * self.width as usize + x as usize] = value;
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&hit| hit).count()
    }
}

/// Inclusive HSV bounds in the 8-bit convention (H 0..=180, S/V 0..=255).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        hsv.iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(value, (lo, hi))| value >= lo && value <= hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_wrong_buffer_size() {
        let err = Frame::new(vec![0; 10], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            CloakError::InvalidFrame {
                expected: 12,
                actual: 10
            }
        ));
    }

    #[test]
    fn frame_rejects_zero_dimensions() {
        assert!(matches!(
            Frame::new(Vec::new(), 0, 4),
            Err(CloakError::EmptyFrame)
        ));
    }

    #[test]
    fn pixel_access_is_bounds_checked() {
        let mut frame = Frame::filled(3, 2, [1, 2, 3]);
        frame.set_pixel(2, 1, [9, 8, 7]);
        assert_eq!(frame.pixel(2, 1), Some([9, 8, 7]));
        assert_eq!(frame.pixel(0, 0), Some([1, 2, 3]));
        assert_eq!(frame.pixel(3, 0), None);
    }

    #[test]
    fn ensure_dimensions_reports_both_sizes() {
        let frame = Frame::filled(4, 3, [0, 0, 0]);
        assert!(frame.ensure_dimensions(4, 3).is_ok());
        let err = frame.ensure_dimensions(640, 480).unwrap_err();
        assert_eq!(err.to_string(), "frame is 4x3, expected 640x480");
    }

    #[test]
    fn color_range_bounds_are_inclusive() {
        let range = ColorRange::new([0, 120, 50], [10, 255, 255]);
        assert!(range.contains([0, 120, 50]));
        assert!(range.contains([10, 255, 255]));
        assert!(!range.contains([11, 200, 200]));
        assert!(!range.contains([5, 119, 200]));
    }

    #[test]
    fn image_conversion_keeps_pixels() {
        let mut frame = Frame::filled(2, 2, [10, 20, 30]);
        frame.set_pixel(1, 0, [200, 100, 0]);
        let image = frame.to_image().expect("valid buffer");
        assert_eq!(image.get_pixel(1, 0).0, [200, 100, 0]);
        assert_eq!(Frame::from_image(image), frame);
    }
}
