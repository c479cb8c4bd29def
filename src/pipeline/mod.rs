pub mod background;
#[cfg(feature = "camera-nokhwa")]
pub mod camera;
pub mod compositor;
pub mod morphology;
pub mod preprocess;
#[cfg(feature = "camera-nokhwa")]
pub mod rgb_converter;
pub mod segmenter;
pub mod stream;

use crate::types::Frame;

// Re-exports for convenience
pub use background::capture_background;
#[cfg(feature = "camera-nokhwa")]
pub use camera::{CameraSource, available_cameras};
pub use compositor::composite;
pub use preprocess::mirror_horizontal;
pub use segmenter::Segmenter;
pub use stream::FrameStream;

/// Anything that hands out camera-sized frames one at a time.
///
/// `Ok(None)` means the source is exhausted. An `Err` is a failed read that
/// the caller may retry.
pub trait FrameSource {
    fn is_open(&self) -> bool;

    fn read_frame(&mut self) -> anyhow::Result<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn read_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        (**self).read_frame()
    }
}
