use rayon::prelude::*;

use crate::types::{CHANNELS, Frame};

/// Flips a frame left-right so the picture behaves like a mirror.
pub fn mirror_horizontal(mut frame: Frame) -> Frame {
    let stride = frame.row_stride();
    frame.rgb.par_chunks_exact_mut(stride).for_each(|row| {
        // Reversing the row also reverses the channel order inside each pixel.
        row.reverse();
        for px in row.chunks_exact_mut(CHANNELS) {
            px.reverse();
        }
    });
    frame
}
