use rayon::prelude::*;

use super::morphology;
use crate::types::{CHANNELS, ColorRange, Frame, Mask};

const HSV_SHIFT: u32 = 12;
const HSV_ROUND: i32 = 1 << (HSV_SHIFT - 1);
const HUE_RANGE: i32 = 180;

/// `round((255 << 12) / v)`, indexed by value.
const SATURATION_DIV: [i32; 256] = division_table(255 << HSV_SHIFT, 1);
/// `round((180 << 12) / (6 * delta))`, indexed by chroma.
const HUE_DIV: [i32; 256] = division_table(HUE_RANGE << HSV_SHIFT, 6);

const fn division_table(numerator: i32, scale: i32) -> [i32; 256] {
    let mut table = [0; 256];
    let mut i = 1;
    while i < 256 {
        let divisor = scale * i as i32;
        table[i] = (2 * numerator + divisor) / (2 * divisor);
        i += 1;
    }
    table
}

/// Converts an RGB triple to 8-bit HSV: hue halved to fit a byte
/// (0..180), saturation and value in 0..=255.
///
/// Fixed-point with 12 fractional bits and reciprocal tables, so results
/// match OpenCV's `COLOR_RGB2HSV` bit for bit, including hues just under
/// 360 degrees wrapping to 0.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let v = r.max(g).max(b);
    let delta = v - r.min(g).min(b);

    let s = (delta * SATURATION_DIV[v as usize] + HSV_ROUND) >> HSV_SHIFT;

    // Red wins ties with green, green wins ties with blue.
    let h = if v == r {
        g - b
    } else if v == g {
        b - r + 2 * delta
    } else {
        r - g + 4 * delta
    };
    let h = (h * HUE_DIV[delta as usize] + HSV_ROUND) >> HSV_SHIFT;
    let h = if h < 0 { h + HUE_RANGE } else { h };

    [h as u8, s as u8, v as u8]
}

/// Flags every pixel whose HSV value falls in at least one of `ranges`.
pub fn color_mask(frame: &Frame, ranges: &[ColorRange]) -> Mask {
    let cells = frame
        .rgb
        .par_chunks_exact(CHANNELS)
        .map(|px| {
            let hsv = rgb_to_hsv(px[0], px[1], px[2]);
            ranges.iter().any(|range| range.contains(hsv))
        })
        .collect();

    Mask {
        cells,
        width: frame.width,
        height: frame.height,
    }
}

/// Thresholds a frame against the cloak color ranges and cleans up the
/// result: open to drop speckle, then dilate to close small holes.
#[derive(Clone, Debug)]
pub struct Segmenter {
    ranges: Vec<ColorRange>,
    kernel_size: usize,
}

impl Segmenter {
    pub fn new(ranges: Vec<ColorRange>, kernel_size: usize) -> Self {
        Self {
            ranges,
            kernel_size,
        }
    }

    pub fn segment(&self, frame: &Frame) -> Mask {
        let raw = color_mask(frame, &self.ranges);
        let opened = morphology::open(&raw, self.kernel_size);
        let mask = morphology::dilate(&opened, self.kernel_size);
        log::trace!(
            "cloak mask: {} raw, {} after cleanup",
            raw.count(),
            mask.count()
        );
        mask
    }
}
