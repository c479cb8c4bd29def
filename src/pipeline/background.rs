use super::preprocess::mirror_horizontal;
use crate::{
    error::CloakError,
    types::{Background, Frame},
};

/// Reads up to `count` frames and keeps the last one, mirrored, as the
/// background plate.
///
/// Earlier frames are discarded; they only give the camera time to settle
/// exposure and white balance.
pub fn capture_background<I>(frames: &mut I, count: usize) -> Result<Background, CloakError>
where
    I: Iterator<Item = Frame>,
{
    let mut captured = 0usize;
    let mut last = None;
    for frame in frames.by_ref().take(count) {
        captured += 1;
        last = Some(frame);
    }

    let Some(frame) = last else {
        return Err(CloakError::SourceUnavailable(
            "no frames received while capturing the background".to_string(),
        ));
    };

    if captured < count {
        log::warn!("source ended after {captured} of {count} background frames, using the last one");
    }
    log::info!(
        "captured background {}x{} from {captured} frame(s)",
        frame.width,
        frame.height
    );

    Ok(Background::new(mirror_horizontal(frame)))
}
