use rayon::prelude::*;

use crate::{
    error::CloakError,
    types::{Background, CHANNELS, Frame, Mask},
};

/// Swaps background pixels in wherever the mask is set.
///
/// Every output channel comes from exactly one of the two inputs; nothing is
/// blended.
pub fn composite(frame: &Frame, background: &Background, mask: &Mask) -> Result<Frame, CloakError> {
    let plate = background.frame();
    frame.ensure_dimensions(plate.width, plate.height)?;
    if mask.width != frame.width || mask.height != frame.height {
        return Err(CloakError::DimensionMismatch {
            expected_width: frame.width,
            expected_height: frame.height,
            actual_width: mask.width,
            actual_height: mask.height,
        });
    }

    let mut rgb = vec![0u8; frame.rgb.len()];
    rgb.par_chunks_exact_mut(CHANNELS)
        .zip(frame.rgb.par_chunks_exact(CHANNELS))
        .zip(plate.rgb.par_chunks_exact(CHANNELS))
        .zip(mask.cells.par_iter())
        .for_each(|(((dst, live), behind), &cloaked)| {
            dst.copy_from_slice(if cloaked { behind } else { live });
        });

    Ok(Frame {
        rgb,
        width: frame.width,
        height: frame.height,
    })
}
